//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Conflict responses always carry the id of the conflicting entity so a
//! client can link to it.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use charter_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("duplicate document content")]
  DuplicateContent { existing: Uuid },

  #[error("an active publication job already exists for this document")]
  ActiveJob { job_id: Uuid },

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<CoreError> for ApiError {
  fn from(e: CoreError) -> Self {
    match e {
      CoreError::Validation { .. } => Self::BadRequest(e.to_string()),
      CoreError::DuplicateContent { existing } => {
        Self::DuplicateContent { existing }
      }
      CoreError::ActiveJobExists { job_id, .. } => Self::ActiveJob { job_id },
      CoreError::DocumentNotFound(_) | CoreError::JobNotFound(_) => {
        Self::NotFound(e.to_string())
      }
      CoreError::InvalidTransition { .. } => Self::Conflict(e.to_string()),
      CoreError::Conversion(_) => Self::Unprocessable(e.to_string()),
      other => Self::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Unauthorized(m) => {
        (StatusCode::UNAUTHORIZED, json!({ "error": m }))
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::DuplicateContent { existing } => (
        StatusCode::CONFLICT,
        json!({
          "error": "Duplicate document content",
          "duplicateDocumentId": existing,
        }),
      ),
      ApiError::ActiveJob { job_id } => (
        StatusCode::CONFLICT,
        json!({
          "error": "An active publication job already exists for this document",
          "jobId": job_id,
        }),
      ),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::Unprocessable(m) => {
        (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": m }))
      }
      ApiError::Store(e) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": e.to_string() }),
      ),
    };
    (status, Json(body)).into_response()
  }
}
