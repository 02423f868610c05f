//! Handlers for `/api/publications` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/publications/:documentId` | Auth. 202 + job; 409 if one is active |
//! | `GET`  | `/api/publications/jobs/:id` | Job status |

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use charter_core::{
  publication::{self, PublicationJob},
  store::DocumentStore,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, auth, error::ApiError};

// ─── View ─────────────────────────────────────────────────────────────────────

/// A job plus its computed flags, as serialized to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
  #[serde(flatten)]
  pub job:         PublicationJob,
  pub is_terminal: bool,
}

impl From<PublicationJob> for JobView {
  fn from(job: PublicationJob) -> Self {
    let is_terminal = job.is_terminal();
    Self { job, is_terminal }
  }
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub target:   Option<String>,
  #[serde(default)]
  pub strategy: Option<String>,
}

/// `POST /api/publications/:documentId`
///
/// Creates the job and drives the worker inline; the response carries the
/// job in whatever state the worker left it (`pr_open`, or `failed` with the
/// recorded reason).
pub async fn create<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Path(document_id): Path<Uuid>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + Send + Sync + 'static,
{
  let created_by = auth::require(&state, &headers).await?;

  let target = body.target.as_deref().unwrap_or("public-repo").trim().to_lowercase();
  if target != "public-repo" {
    return Err(ApiError::BadRequest("target must be public-repo".into()));
  }
  let strategy = body
    .strategy
    .as_deref()
    .unwrap_or("pull-request")
    .trim()
    .to_lowercase();
  if strategy != "pull-request" {
    return Err(ApiError::BadRequest("strategy must be pull-request".into()));
  }

  let job = publication::create_publication(
    state.store.as_ref(),
    document_id,
    &state.config.publish_repo,
    &created_by,
  )
  .await?;

  if let Err(err) = publication::run_publication(
    state.store.as_ref(),
    state.blobs.as_ref(),
    state.publisher.as_ref(),
    job.id,
  )
  .await
  {
    tracing::warn!(job = %job.id, error = %err, "publication worker failed");
  }

  let persisted = state
    .store
    .get_job(job.id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .unwrap_or(job);
  Ok((
    StatusCode::ACCEPTED,
    Json(json!({ "job": JobView::from(persisted) })),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /api/publications/jobs/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + Send + Sync + 'static,
{
  let job = state
    .store
    .get_job(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("publication job {id} not found")))?;
  Ok(Json(json!({ "job": JobView::from(job) })))
}
