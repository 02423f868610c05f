//! Async HTTP client wrapping the charter JSON API.

use anyhow::{Context, Result, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use charter_core::{
  document::DocumentRecord, latest::LatestIndex, publication::PublicationJob,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

/// Connection settings for the charter API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Bearer token; empty sends unauthenticated requests.
  pub token:    String,
}

/// Async HTTP client for the charter JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

/// The fields of one upload submission.
pub struct NewUpload<'a> {
  pub file_name:      &'a str,
  pub mime_type:      &'a str,
  pub content:        &'a [u8],
  pub platform:       &'a str,
  pub line:           &'a str,
  pub doc_type:       &'a str,
  pub lang:           &'a str,
  pub effective_date: &'a str,
}

/// Result of one upload attempt.
pub enum UploadOutcome {
  Created(DocumentRecord),
  /// The scope already holds this content; carries the existing record id.
  Duplicate(Uuid),
}

#[derive(Deserialize)]
struct DocumentResponse {
  document: DocumentRecord,
}

#[derive(Deserialize)]
struct JobResponse {
  job: PublicationJob,
}

#[derive(Deserialize)]
struct ConflictResponse {
  #[serde(rename = "duplicateDocumentId")]
  duplicate_document_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct LatestResponse {
  latest: LatestIndex,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(180))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.token.is_empty() {
      req
    } else {
      req.bearer_auth(&self.config.token)
    }
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  /// `POST /api/documents/upload`
  pub async fn upload_document(
    &self,
    upload: NewUpload<'_>,
  ) -> Result<UploadOutcome> {
    let body = json!({
      "fileName": upload.file_name,
      "mimeType": upload.mime_type,
      "contentBase64": B64.encode(upload.content),
      "platform": upload.platform,
      "line": upload.line,
      "docType": upload.doc_type,
      "lang": upload.lang,
      "effectiveDate": upload.effective_date,
    });

    let resp = self
      .auth(self.client.post(self.url("/api/documents/upload")))
      .json(&body)
      .send()
      .await
      .context("POST /api/documents/upload failed")?;

    match resp.status() {
      StatusCode::CREATED => {
        let body: DocumentResponse =
          resp.json().await.context("deserialising upload response")?;
        Ok(UploadOutcome::Created(body.document))
      }
      StatusCode::CONFLICT => {
        let body: ConflictResponse =
          resp.json().await.context("deserialising conflict response")?;
        let existing = body
          .duplicate_document_id
          .ok_or_else(|| anyhow!("conflict response without a document id"))?;
        Ok(UploadOutcome::Duplicate(existing))
      }
      status => Err(anyhow!(
        "POST /api/documents/upload → {status}: {}",
        resp.text().await.unwrap_or_default()
      )),
    }
  }

  // ── Publications ──────────────────────────────────────────────────────────

  /// `POST /api/publications/:documentId`
  pub async fn create_publication(
    &self,
    document_id: Uuid,
  ) -> Result<PublicationJob> {
    let resp = self
      .auth(
        self
          .client
          .post(self.url(&format!("/api/publications/{document_id}"))),
      )
      .json(&json!({ "target": "public-repo", "strategy": "pull-request" }))
      .send()
      .await
      .context("POST /api/publications failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!(
        "POST /api/publications/{document_id} → {}: {}",
        resp.status(),
        resp.text().await.unwrap_or_default()
      ));
    }
    let body: JobResponse =
      resp.json().await.context("deserialising job response")?;
    Ok(body.job)
  }

  // ── Public index ──────────────────────────────────────────────────────────

  /// `GET /api/public/latest.json`
  pub async fn latest(&self) -> Result<LatestIndex> {
    let resp = self
      .client
      .get(self.url("/api/public/latest.json"))
      .send()
      .await
      .context("GET /api/public/latest.json failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /api/public/latest.json → {}", resp.status()));
    }
    let body: LatestResponse =
      resp.json().await.context("deserialising latest index")?;
    Ok(body.latest)
  }
}
