//! Handlers for `/api/documents` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/documents/upload` | Auth. Base64 JSON body; 201, 409 on duplicate |
//! | `GET`  | `/api/documents` | Scope filters, `search`, `includeDeleted` |
//! | `DELETE` | `/api/documents/:id` | Auth. Idempotent soft delete |
//! | `GET`  | `/api/documents/:id/download` | PDF bytes; migrates legacy storage |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use charter_core::{
  document::{DocumentQuery, DocumentRecord},
  ingest::{self, UploadRequest},
  scope::RawScope,
  store::DocumentStore,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, auth, error::ApiError};

// ─── View ─────────────────────────────────────────────────────────────────────

/// A record plus its computed flags, as serialized to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
  #[serde(flatten)]
  pub record:     DocumentRecord,
  pub is_deleted: bool,
}

impl From<DocumentRecord> for DocumentView {
  fn from(record: DocumentRecord) -> Self {
    let is_deleted = record.is_deleted();
    Self { record, is_deleted }
  }
}

// ─── Upload ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /api/documents/upload`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBody {
  #[serde(default)]
  pub file_name:      String,
  #[serde(default)]
  pub mime_type:      Option<String>,
  #[serde(default)]
  pub content_base64: String,
  #[serde(flatten)]
  pub scope:          RawScope,
}

/// `POST /api/documents/upload` — returns 201 + the stored record.
pub async fn upload<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Json(body): Json<UploadBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + Send + Sync + 'static,
{
  auth::require(&state, &headers).await?;

  if body.file_name.trim().is_empty() || body.content_base64.trim().is_empty() {
    return Err(ApiError::BadRequest(
      "fileName and contentBase64 are required".into(),
    ));
  }
  let content = B64
    .decode(body.content_base64.trim())
    .map_err(|_| ApiError::BadRequest("invalid base64 payload".into()))?;

  let record = ingest::ingest_document(
    state.store.as_ref(),
    state.converter.as_ref(),
    state.blobs.as_ref(),
    UploadRequest {
      file_name: body.file_name,
      mime_type: body.mime_type,
      content,
      scope: body.scope,
    },
  )
  .await?;

  Ok((
    StatusCode::CREATED,
    Json(json!({ "document": DocumentView::from(record) })),
  ))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  #[serde(default)]
  pub platform:        Option<String>,
  #[serde(default)]
  pub line:            Option<String>,
  #[serde(default)]
  pub doc_type:        Option<String>,
  #[serde(default)]
  pub lang:            Option<String>,
  #[serde(default)]
  pub effective_date:  Option<String>,
  #[serde(default)]
  pub search:          Option<String>,
  #[serde(default)]
  pub include_deleted: bool,
}

impl ListParams {
  fn into_query(self) -> DocumentQuery {
    fn lower(v: Option<String>) -> Option<String> {
      v.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty())
    }
    fn trimmed(v: Option<String>) -> Option<String> {
      v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    }
    DocumentQuery {
      platform:        lower(self.platform),
      line:            lower(self.line),
      doc_type:        lower(self.doc_type),
      lang:            trimmed(self.lang),
      effective_date:  trimmed(self.effective_date),
      search:          lower(self.search),
      include_deleted: self.include_deleted,
    }
  }
}

/// `GET /api/documents` — most recent submission first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + Send + Sync + 'static,
{
  let documents = state
    .store
    .query(&params.into_query())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let views: Vec<DocumentView> =
    documents.into_iter().map(DocumentView::from).collect();
  Ok(Json(json!({ "documents": views })))
}

// ─── Soft delete ──────────────────────────────────────────────────────────────

/// `DELETE /api/documents/:id` — idempotent; deleting twice returns the same
/// terminal state.
pub async fn soft_delete<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + Send + Sync + 'static,
{
  auth::require(&state, &headers).await?;

  let record = state
    .store
    .soft_delete_document(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("document {id} not found")))?;
  Ok(Json(json!({ "document": DocumentView::from(record) })))
}

// ─── Download ─────────────────────────────────────────────────────────────────

/// `GET /api/documents/:id/download`
pub async fn download<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + Send + Sync + 'static,
{
  let (pdf, file_name) = ingest::resolve_pdf(
    state.store.as_ref(),
    state.converter.as_ref(),
    state.blobs.as_ref(),
    id,
  )
  .await?;

  Ok((
    [
      (header::CONTENT_TYPE, "application/pdf".to_string()),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{file_name}\""),
      ),
    ],
    pdf,
  ))
}
