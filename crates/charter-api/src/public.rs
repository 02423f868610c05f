//! Handlers for the unauthenticated `/api/public` surface.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/api/public/latest.json` | Nested platform → docType → lang index |
//! | `GET` | `/api/public/{docType}_{platform}_{lang}.pdf` | Latest PDF for the scope |

use axum::{
  Json,
  extract::{Path, State},
  http::header,
  response::IntoResponse,
};
use charter_core::{
  ingest, latest,
  scope::DocType,
  store::DocumentStore,
};
use serde_json::json;

use crate::{AppState, error::ApiError};

/// `GET /api/public/latest.json`
pub async fn latest_index<S>(
  State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + Send + Sync + 'static,
{
  let documents = state
    .store
    .documents()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(json!({ "latest": latest::build_latest(&documents) })))
}

/// `GET /api/public/{docType}_{platform}_{lang}.pdf`
///
/// The slug is lower-cased before parsing, matching the published file
/// names; the platform segment may itself contain underscores.
pub async fn latest_pdf<S>(
  State(state): State<AppState<S>>,
  Path(file): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + Send + Sync + 'static,
{
  let (platform, doc_type, lang) = parse_public_slug(&file)
    .ok_or_else(|| ApiError::NotFound("invalid public filename format".into()))?;

  let documents = state
    .store
    .documents()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let record = latest::latest_for(&documents, &platform, doc_type, &lang)
    .ok_or_else(|| {
      ApiError::NotFound("no document found for requested scope".into())
    })?;

  let (pdf, file_name) = ingest::resolve_pdf(
    state.store.as_ref(),
    state.converter.as_ref(),
    state.blobs.as_ref(),
    record.id,
  )
  .await?;

  Ok((
    [
      (header::CONTENT_TYPE, "application/pdf".to_string()),
      (
        header::CONTENT_DISPOSITION,
        format!("inline; filename=\"{file_name}\""),
      ),
      (header::CACHE_CONTROL, "public, max-age=60".to_string()),
    ],
    pdf,
  ))
}

/// Split `{docType}_{platform}_{lang}.pdf` into its scope parts.
fn parse_public_slug(file: &str) -> Option<(String, DocType, String)> {
  let slug = file.to_lowercase();
  let slug = slug.strip_suffix(".pdf")?;
  let (doc_type_raw, rest) = slug.split_once('_')?;
  let doc_type = DocType::parse(doc_type_raw)?;
  let (platform, lang) = rest.rsplit_once('_')?;
  if platform.is_empty() || lang.is_empty() {
    return None;
  }
  Some((platform.to_string(), doc_type, lang.to_string()))
}
