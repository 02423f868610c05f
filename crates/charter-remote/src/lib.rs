//! External HTTP collaborators for charter: the PDF conversion service and
//! the public-repository publication target.
//!
//! Both are opaque, potentially unavailable dependencies; everything here
//! surfaces failures as typed errors for the core workflows to report.

pub mod convert;
pub mod error;
pub mod publish;

pub use convert::{ConverterClient, HttpConverter};
pub use error::{Error, Result};
pub use publish::{ContentsClient, GitHubPublisher, OfflinePublisher, Publisher};
