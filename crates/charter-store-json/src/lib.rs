//! JSON-file backend for the charter document store.
//!
//! The whole collection — documents and publication jobs — lives in one
//! serialized JSON document that is read fully on open and rewritten fully on
//! every mutation. A [`tokio::sync::RwLock`] serializes writers; replacement
//! on disk is write-new-then-rename, so a failed write never truncates the
//! collection.

mod blob;
mod persist;
mod store;

pub mod error;

pub use blob::FsBlobStore;
pub use error::{Error, Result};
pub use persist::Collection;
pub use store::JsonStore;
