//! The `DocumentStore` and `BlobStore` traits.
//!
//! Implemented by storage backends (e.g. `charter-store-json`). Higher layers
//! (`charter-api`, `charter-cli`) depend on these abstractions, not on any
//! concrete backend.
//!
//! The document store is a serialized log-structured collection: it appends
//! and updates records but performs no domain validation — duplicate
//! detection, version assignment, job exclusivity and transition legality
//! live in the calling workflows.

use std::future::Future;

use uuid::Uuid;

use crate::{
  document::{DocumentQuery, DocumentRecord, StorageMigration},
  publication::{JobUpdate, PublicationJob},
};

// ─── Document store ──────────────────────────────────────────────────────────

/// Abstraction over the persisted document + publication-job collection.
///
/// Mutating methods are serialized by the implementation; reads observe a
/// consistent snapshot. Methods taking an id return `None` for unknown ids.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Documents ─────────────────────────────────────────────────────────

  /// Full snapshot of every record, soft-deleted included, in insertion
  /// order.
  fn documents(
    &self,
  ) -> impl Future<Output = Result<Vec<DocumentRecord>, Self::Error>> + Send + '_;

  /// Retrieve a record by id, soft-deleted included.
  fn get_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DocumentRecord>, Self::Error>> + Send + '_;

  /// Append a fully-built record. The caller has already run duplicate
  /// detection and version assignment.
  fn append_document(
    &self,
    record: DocumentRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Soft-delete a record. Idempotent: an already-deleted record is
  /// returned unchanged.
  fn soft_delete_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DocumentRecord>, Self::Error>> + Send + '_;

  /// Replace a record's storage fields in place, preserving identity, scope
  /// and version.
  fn migrate_storage(
    &self,
    id: Uuid,
    migration: StorageMigration,
  ) -> impl Future<Output = Result<Option<DocumentRecord>, Self::Error>> + Send + '_;

  /// Records matching `query`, most recent submission first.
  fn query<'a>(
    &'a self,
    query: &'a DocumentQuery,
  ) -> impl Future<Output = Result<Vec<DocumentRecord>, Self::Error>> + Send + 'a;

  // ── Publication jobs ──────────────────────────────────────────────────

  /// Full snapshot of every publication job, in insertion order.
  fn jobs(
    &self,
  ) -> impl Future<Output = Result<Vec<PublicationJob>, Self::Error>> + Send + '_;

  fn get_job(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PublicationJob>, Self::Error>> + Send + '_;

  /// Append a freshly-queued job. Exclusivity has already been checked by
  /// the creating workflow.
  fn append_job(
    &self,
    job: PublicationJob,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Apply a transition payload to a job, stamping `updated_at`. Transition
  /// legality is the caller's concern.
  fn update_job(
    &self,
    id: Uuid,
    update: JobUpdate,
  ) -> impl Future<Output = Result<Option<PublicationJob>, Self::Error>> + Send + '_;
}

// ─── Blob store ──────────────────────────────────────────────────────────────

/// Content storage keyed by generated file names.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn put<'a>(
    &'a self,
    name: &'a str,
    bytes: &'a [u8],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send + 'a;

  /// Remove a blob if present; unknown names are not an error.
  fn remove<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
