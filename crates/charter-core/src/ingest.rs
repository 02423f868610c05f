//! The upload workflow: normalise, convert, hash, deduplicate, version,
//! store — plus the lazy PDF migration of legacy records.

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  convert::{self, Converter},
  document::{self, DocumentRecord, StorageMigration},
  filename,
  hash::sha256_hex,
  scope::{RawScope, Scope},
  store::{BlobStore, DocumentStore},
};

pub const PDF_MIME: &str = "application/pdf";
pub const DEFAULT_MIME: &str = "application/octet-stream";

// ─── Upload ──────────────────────────────────────────────────────────────────

/// An upload submission before normalisation.
#[derive(Debug, Clone)]
pub struct UploadRequest {
  pub file_name: String,
  pub mime_type: Option<String>,
  pub content:   Vec<u8>,
  pub scope:     RawScope,
}

/// Ingest one submission.
///
/// The record is appended only after conversion, hashing and duplicate
/// detection all succeed; a failure at any step leaves the document store
/// untouched. A duplicate surfaces as [`Error::DuplicateContent`] carrying
/// the existing record's id.
pub async fn ingest_document<S, C, B>(
  store: &S,
  converter: &C,
  blobs: &B,
  request: UploadRequest,
) -> Result<DocumentRecord>
where
  S: DocumentStore,
  C: Converter,
  B: BlobStore,
{
  if request.file_name.trim().is_empty() {
    return Err(Error::Validation {
      field:  "fileName",
      reason: "fileName is required".into(),
    });
  }
  if request.content.is_empty() {
    return Err(Error::Validation {
      field:  "content",
      reason: "file content is required".into(),
    });
  }

  let scope = Scope::normalize(&request.scope)?;

  let (pdf, converted) = if convert::needs_conversion(&request.file_name) {
    let pdf = converter
      .convert(&request.content, &request.file_name)
      .await
      .map_err(|e| Error::Conversion(e.to_string()))?;
    if pdf.is_empty() {
      return Err(Error::Conversion("converter produced empty output".into()));
    }
    (pdf, true)
  } else {
    (request.content.clone(), false)
  };

  let source_sha256 = sha256_hex(&request.content);
  let sha256 = sha256_hex(&pdf);

  let snapshot = store.documents().await.map_err(Error::storage)?;
  if let Some(existing) =
    document::find_duplicate(&snapshot, &scope, &source_sha256, &sha256)
  {
    return Err(Error::DuplicateContent { existing: existing.id });
  }

  let id = Uuid::new_v4();
  let download_file_name = filename::download_file_name(&scope);
  let stored_file_name = filename::stored_file_name(id, &download_file_name);
  blobs
    .put(&stored_file_name, &pdf)
    .await
    .map_err(Error::storage)?;

  let now = Utc::now();
  let record = DocumentRecord {
    id,
    original_file_name: request.file_name,
    download_file_name,
    stored_file_name,
    original_mime_type: request
      .mime_type
      .unwrap_or_else(|| DEFAULT_MIME.to_string()),
    source_sha256: Some(source_sha256),
    mime_type: PDF_MIME.to_string(),
    size_bytes: pdf.len() as u64,
    sha256,
    version: document::next_version(&snapshot, &scope),
    scope,
    converted_to_pdf: converted,
    created_at: now,
    updated_at: now,
    deleted_at: None,
  };
  store
    .append_document(record.clone())
    .await
    .map_err(Error::storage)?;
  Ok(record)
}

// ─── Lazy migration ──────────────────────────────────────────────────────────

/// Fetch the PDF bytes for a stored record, converting and migrating legacy
/// non-PDF storage on first access.
///
/// Returns the PDF bytes and the download file name. The record keeps its
/// id, scope and version; only the storage fields change.
pub async fn resolve_pdf<S, C, B>(
  store: &S,
  converter: &C,
  blobs: &B,
  id: Uuid,
) -> Result<(Vec<u8>, String)>
where
  S: DocumentStore,
  C: Converter,
  B: BlobStore,
{
  let document = store
    .get_document(id)
    .await
    .map_err(Error::storage)?
    .ok_or(Error::DocumentNotFound(id))?;

  let raw = blobs
    .get(&document.stored_file_name)
    .await
    .map_err(Error::storage)?;

  let already_pdf = document.mime_type.eq_ignore_ascii_case(PDF_MIME)
    && document.stored_file_name.to_lowercase().ends_with(".pdf");
  if already_pdf {
    return Ok((raw, document.download_file_name));
  }

  let pdf = converter
    .convert(&raw, &document.original_file_name)
    .await
    .map_err(|e| Error::Conversion(e.to_string()))?;

  let download_file_name = filename::download_file_name(&document.scope);
  let stored_file_name = filename::stored_file_name(document.id, &download_file_name);
  blobs
    .put(&stored_file_name, &pdf)
    .await
    .map_err(Error::storage)?;
  if stored_file_name != document.stored_file_name {
    blobs
      .remove(&document.stored_file_name)
      .await
      .map_err(Error::storage)?;
  }

  let migration = StorageMigration {
    stored_file_name,
    download_file_name: download_file_name.clone(),
    mime_type: PDF_MIME.to_string(),
    size_bytes: pdf.len() as u64,
    sha256: sha256_hex(&pdf),
  };
  store
    .migrate_storage(document.id, migration)
    .await
    .map_err(Error::storage)?
    .ok_or(Error::DocumentNotFound(document.id))?;

  Ok((pdf, download_file_name))
}
