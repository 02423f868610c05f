//! Error types for `charter-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::publication::JobStatus;

#[derive(Debug, Error)]
pub enum Error {
  /// A scope or upload field failed validation.
  #[error("{field}: {reason}")]
  Validation { field: &'static str, reason: String },

  /// Equivalent content already exists in the target scope.
  #[error("duplicate document content (existing document {existing})")]
  DuplicateContent { existing: Uuid },

  /// An active publication job already exists for the document.
  #[error("active publication job {job_id} already exists for document {document_id}")]
  ActiveJobExists { document_id: Uuid, job_id: Uuid },

  #[error("document not found: {0}")]
  DocumentNotFound(Uuid),

  #[error("publication job not found: {0}")]
  JobNotFound(Uuid),

  #[error("illegal job transition: {from} -> {to}")]
  InvalidTransition { from: JobStatus, to: JobStatus },

  /// The external converter failed or is not configured.
  #[error("conversion failed: {0}")]
  Conversion(String),

  /// The publication target rejected a push or pull-request step.
  #[error("publication failed: {0}")]
  Publication(String),

  /// A store or blob backend failed.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap a backend error as [`Error::Storage`].
  pub fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
