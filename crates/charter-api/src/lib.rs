//! JSON REST layer for the charter document service.
//!
//! Exposes an axum [`Router`] backed by any
//! [`charter_core::store::DocumentStore`]. The converter, blob store and
//! publication target are concrete deployment choices wired in through
//! [`AppState`]; TLS and reverse-proxy concerns are the caller's
//! responsibility.

pub mod auth;
pub mod documents;
pub mod error;
pub mod public;
pub mod publications;
pub mod session;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json,
  Router,
  extract::State,
  routing::{delete, get, post},
};
use charter_core::{convert::Converter as _, store::DocumentStore};
use charter_remote::{ConverterClient, Publisher};
use charter_store_json::FsBlobStore;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use session::SessionStore;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` plus the
/// `CHARTER_`-prefixed environment.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  /// Path of the persisted JSON collection.
  pub data_file:          PathBuf,
  /// Root directory of the blob store.
  pub storage_dir:        PathBuf,
  /// Base URL of the conversion service; absent disables conversion.
  #[serde(default)]
  pub converter_url:      Option<String>,
  /// `owner/repo` publication jobs push to.
  pub publish_repo:       String,
  /// Token for the publication target; absent selects offline references.
  #[serde(default)]
  pub publish_token:      Option<String>,
  #[serde(default = "default_require_login")]
  pub require_login:      bool,
  pub auth_username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub auth_password_hash: String,
}

fn default_require_login() -> bool {
  true
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: DocumentStore> {
  pub store:     Arc<S>,
  pub blobs:     Arc<FsBlobStore>,
  pub converter: Arc<ConverterClient>,
  pub publisher: Arc<Publisher>,
  pub sessions:  Arc<SessionStore>,
  pub config:    Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: DocumentStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Liveness
    .route("/api/health", get(health::<S>))
    // Sessions
    .route("/api/auth/login", post(auth::login::<S>))
    .route("/api/auth/me", get(auth::me::<S>))
    .route("/api/auth/logout", post(auth::logout::<S>))
    // Documents
    .route("/api/documents", get(documents::list::<S>))
    .route("/api/documents/upload", post(documents::upload::<S>))
    .route("/api/documents/{id}", delete(documents::soft_delete::<S>))
    .route("/api/documents/{id}/download", get(documents::download::<S>))
    // Publications
    .route("/api/publications/{document_id}", post(publications::create::<S>))
    .route("/api/publications/jobs/{id}", get(publications::get_one::<S>))
    // Public surface
    .route("/api/public/latest.json", get(public::latest_index::<S>))
    .route("/api/public/{file}", get(public::latest_pdf::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// `GET /api/health` — liveness plus converter reachability.
async fn health<S>(State(state): State<AppState<S>>) -> Json<serde_json::Value>
where
  S: DocumentStore + Clone + Send + Sync + 'static,
{
  let converter = state.converter.probe().await;
  Json(json!({ "status": "ok", "converter": converter }))
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use charter_core::store::BlobStore as _;
  use charter_remote::OfflinePublisher;
  use charter_store_json::JsonStore;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  async fn make_state(
    require_login: bool,
  ) -> (AppState<JsonStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::open(dir.path().join("db.json")).await.unwrap();
    let blobs = FsBlobStore::open(dir.path().join("storage")).await.unwrap();

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(b"secret", &salt)
      .unwrap()
      .to_string();

    let config = ServerConfig {
      host:               "127.0.0.1".to_string(),
      port:               8787,
      data_file:          dir.path().join("db.json"),
      storage_dir:        dir.path().join("storage"),
      converter_url:      None,
      publish_repo:       "acme/legal-public".to_string(),
      publish_token:      None,
      require_login,
      auth_username:      "editor".to_string(),
      auth_password_hash: hash,
    };

    let state = AppState {
      store:     Arc::new(store),
      blobs:     Arc::new(blobs),
      converter: Arc::new(ConverterClient::Disabled),
      publisher: Arc::new(Publisher::Offline(OfflinePublisher)),
      sessions:  Arc::new(SessionStore::new()),
      config:    Arc::new(config),
    };
    (state, dir)
  }

  async fn send(
    state: AppState<JsonStore>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      builder =
        builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    router(state).oneshot(req).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn raw_body(resp: Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap()
      .to_vec()
  }

  async fn login(state: &AppState<JsonStore>) -> String {
    let resp = send(
      state.clone(),
      "POST",
      "/api/auth/login",
      None,
      Some(json!({ "username": "editor", "password": "secret" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    json_body(resp).await["token"].as_str().unwrap().to_string()
  }

  fn upload_body(file_name: &str, content: &[u8], date: &str) -> Value {
    json!({
      "fileName": file_name,
      "contentBase64": B64.encode(content),
      "platform": "acme",
      "docType": "terms",
      "lang": "it",
      "effectiveDate": date,
    })
  }

  async fn upload(
    state: &AppState<JsonStore>,
    token: &str,
    file_name: &str,
    content: &[u8],
    date: &str,
  ) -> Value {
    let resp = send(
      state.clone(),
      "POST",
      "/api/documents/upload",
      Some(token),
      Some(upload_body(file_name, content, date)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await["document"].clone()
  }

  // ── Health ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_reports_converter_mode() {
    let (state, _dir) = make_state(true).await;
    let resp = send(state, "GET", "/api/health", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["converter"]["mode"], "none");
    assert_eq!(body["converter"]["reachable"], false);
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn upload_requires_login() {
    let (state, _dir) = make_state(true).await;
    let resp = send(
      state,
      "POST",
      "/api/documents/upload",
      None,
      Some(upload_body("terms.pdf", b"%PDF-1.4", "2024-01-01")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn wrong_password_is_rejected() {
    let (state, _dir) = make_state(true).await;
    let resp = send(
      state,
      "POST",
      "/api/auth/login",
      None,
      Some(json!({ "username": "editor", "password": "nope" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn me_and_logout_follow_the_session() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;

    let resp =
      send(state.clone(), "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["user"]["username"], "editor");

    let resp =
      send(state.clone(), "POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp =
      send(state.clone(), "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // A revoked token no longer authorizes uploads either.
    let resp = send(
      state,
      "POST",
      "/api/documents/upload",
      Some(&token),
      Some(upload_body("terms.pdf", b"%PDF-1.4", "2024-01-01")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn disabled_login_allows_anonymous_mutation() {
    let (state, _dir) = make_state(false).await;
    let resp = send(
      state,
      "POST",
      "/api/documents/upload",
      None,
      Some(upload_body("terms.pdf", b"%PDF-1.4", "2024-01-01")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
  }

  // ── Upload ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn upload_and_list_round_trip() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;

    let doc =
      upload(&state, &token, "Terms 2024.pdf", b"%PDF-1.4 one", "2024-01-01")
        .await;
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["isDeleted"], false);
    assert_eq!(doc["downloadFileName"], "terms_acme_it.pdf");
    assert_eq!(doc["convertedToPdf"], false);
    assert!(doc["sha256"].as_str().unwrap().len() == 64);

    let resp = send(state, "GET", "/api/documents", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["documents"].as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn malformed_date_is_a_validation_error() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;

    let resp = send(
      state,
      "POST",
      "/api/documents/upload",
      Some(&token),
      Some(upload_body("terms.pdf", b"%PDF-1.4", "2024/01/01")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert!(body["error"].as_str().unwrap().contains("effectiveDate"));
  }

  #[tokio::test]
  async fn invalid_base64_is_rejected() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;

    let mut body = upload_body("terms.pdf", b"x", "2024-01-01");
    body["contentBase64"] = json!("!!!not-base64!!!");
    let resp =
      send(state, "POST", "/api/documents/upload", Some(&token), Some(body))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn duplicate_upload_conflicts_with_reference() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;

    let first =
      upload(&state, &token, "terms.pdf", b"%PDF-1.4 same", "2024-01-01").await;

    let resp = send(
      state,
      "POST",
      "/api/documents/upload",
      Some(&token),
      Some(upload_body("renamed.pdf", b"%PDF-1.4 same", "2024-01-01")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = json_body(resp).await;
    assert_eq!(body["duplicateDocumentId"], first["id"]);
  }

  #[tokio::test]
  async fn conversion_without_a_converter_is_unprocessable() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;

    let resp = send(
      state,
      "POST",
      "/api/documents/upload",
      Some(&token),
      Some(upload_body("terms.docx", b"doc bytes", "2024-01-01")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  // ── List filters ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_filters_by_scope_and_search() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;
    upload(&state, &token, "Terms Final.pdf", b"%PDF-1.4 a", "2024-01-01").await;

    let resp = send(
      state.clone(),
      "GET",
      "/api/documents?docType=privacy",
      None,
      None,
    )
    .await;
    assert!(json_body(resp).await["documents"].as_array().unwrap().is_empty());

    let resp = send(
      state.clone(),
      "GET",
      "/api/documents?search=final",
      None,
      None,
    )
    .await;
    assert_eq!(json_body(resp).await["documents"].as_array().unwrap().len(), 1);

    let resp =
      send(state, "GET", "/api/documents?platform=ACME", None, None).await;
    // Query platforms are normalised like upload platforms.
    assert_eq!(json_body(resp).await["documents"].as_array().unwrap().len(), 1);
  }

  // ── Soft delete ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn soft_delete_is_idempotent_over_http() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;
    let doc =
      upload(&state, &token, "terms.pdf", b"%PDF-1.4 x", "2024-01-01").await;
    let id = doc["id"].as_str().unwrap().to_string();

    let resp = send(
      state.clone(),
      "DELETE",
      &format!("/api/documents/{id}"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let first = json_body(resp).await["document"].clone();
    assert_eq!(first["isDeleted"], true);

    let resp = send(
      state.clone(),
      "DELETE",
      &format!("/api/documents/{id}"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let second = json_body(resp).await["document"].clone();
    assert_eq!(second["deletedAt"], first["deletedAt"]);

    // Deleted records leave the default listing but not the full one.
    let resp = send(state.clone(), "GET", "/api/documents", None, None).await;
    assert!(json_body(resp).await["documents"].as_array().unwrap().is_empty());
    let resp = send(
      state,
      "GET",
      "/api/documents?includeDeleted=true",
      None,
      None,
    )
    .await;
    assert_eq!(json_body(resp).await["documents"].as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn deleting_an_unknown_document_is_404() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;
    let resp = send(
      state,
      "DELETE",
      &format!("/api/documents/{}", uuid::Uuid::new_v4()),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Download ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn download_returns_the_stored_pdf() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;
    let doc =
      upload(&state, &token, "terms.pdf", b"%PDF-1.4 bytes", "2024-01-01").await;
    let id = doc["id"].as_str().unwrap().to_string();

    let resp = send(
      state,
      "GET",
      &format!("/api/documents/{id}/download"),
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers().get(header::CONTENT_TYPE).unwrap(),
      "application/pdf"
    );
    let disposition = resp
      .headers()
      .get(header::CONTENT_DISPOSITION)
      .unwrap()
      .to_str()
      .unwrap()
      .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("terms_acme_it.pdf"));
    assert_eq!(raw_body(resp).await, b"%PDF-1.4 bytes");
  }

  // ── Public surface ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn public_index_selects_the_latest_record() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;
    upload(&state, &token, "old.pdf", b"%PDF-1.4 old", "2024-01-01").await;
    let newer =
      upload(&state, &token, "new.pdf", b"%PDF-1.4 new", "2024-06-01").await;

    let resp =
      send(state, "GET", "/api/public/latest.json", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    let entry = &body["latest"]["acme"]["terms"]["it"];
    assert_eq!(entry["id"], newer["id"]);
    assert_eq!(entry["effectiveDate"], "2024-06-01");
    assert_eq!(entry["url"], "/api/public/terms_acme_it.pdf");
  }

  #[tokio::test]
  async fn public_pdf_serves_the_latest_inline() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;
    upload(&state, &token, "old.pdf", b"%PDF-1.4 old", "2024-01-01").await;
    upload(&state, &token, "new.pdf", b"%PDF-1.4 new", "2024-06-01").await;

    let resp = send(
      state,
      "GET",
      "/api/public/terms_acme_it.pdf",
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers().get(header::CACHE_CONTROL).unwrap(),
      "public, max-age=60"
    );
    let disposition = resp
      .headers()
      .get(header::CONTENT_DISPOSITION)
      .unwrap()
      .to_str()
      .unwrap()
      .to_string();
    assert!(disposition.starts_with("inline"));
    assert_eq!(raw_body(resp).await, b"%PDF-1.4 new");
  }

  #[tokio::test]
  async fn public_pdf_unknown_scope_is_404() {
    let (state, _dir) = make_state(true).await;
    let resp = send(
      state.clone(),
      "GET",
      "/api/public/terms_acme_it.pdf",
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp =
      send(state, "GET", "/api/public/not-a-slug.pdf", None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Publications ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn publication_runs_to_pr_open() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;
    let doc =
      upload(&state, &token, "terms.pdf", b"%PDF-1.4 pub", "2024-01-01").await;
    let id = doc["id"].as_str().unwrap().to_string();

    let resp = send(
      state.clone(),
      "POST",
      &format!("/api/publications/{id}"),
      Some(&token),
      Some(json!({})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let job = json_body(resp).await["job"].clone();
    assert_eq!(job["status"], "pr_open");
    assert_eq!(job["isTerminal"], false);
    assert_eq!(job["createdBy"], "editor");
    assert_eq!(job["targetRepo"], "acme/legal-public");
    assert_eq!(job["targetBranch"], "publish/acme/terms/it/1");
    assert_eq!(job["commitSha"].as_str().unwrap().len(), 40);
    assert!(job["prUrl"].as_str().unwrap().contains("/pull/"));

    let job_id = job["id"].as_str().unwrap().to_string();
    let resp = send(
      state,
      "GET",
      &format!("/api/publications/jobs/{job_id}"),
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["job"]["status"], "pr_open");
  }

  #[tokio::test]
  async fn active_job_blocks_a_second_publication() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;
    let doc =
      upload(&state, &token, "terms.pdf", b"%PDF-1.4 pub", "2024-01-01").await;
    let id = doc["id"].as_str().unwrap().to_string();

    let resp = send(
      state.clone(),
      "POST",
      &format!("/api/publications/{id}"),
      Some(&token),
      Some(json!({})),
    )
    .await;
    let job = json_body(resp).await["job"].clone();

    let resp = send(
      state,
      "POST",
      &format!("/api/publications/{id}"),
      Some(&token),
      Some(json!({})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(resp).await["jobId"], job["id"]);
  }

  #[tokio::test]
  async fn failed_publication_frees_the_document() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;
    let doc =
      upload(&state, &token, "terms.pdf", b"%PDF-1.4 pub", "2024-01-01").await;
    let id = doc["id"].as_str().unwrap().to_string();

    // Force the worker to fail by removing the stored blob.
    let stored = doc["storedFileName"].as_str().unwrap();
    state.blobs.remove(stored).await.unwrap();

    let resp = send(
      state.clone(),
      "POST",
      &format!("/api/publications/{id}"),
      Some(&token),
      Some(json!({})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let failed = json_body(resp).await["job"].clone();
    assert_eq!(failed["status"], "failed");
    assert_eq!(failed["isTerminal"], true);
    assert!(failed["errorMessage"].as_str().unwrap().len() > 0);

    // The failed job is terminal, so a retry creates a fresh job.
    let resp = send(
      state,
      "POST",
      &format!("/api/publications/{id}"),
      Some(&token),
      Some(json!({})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let retry = json_body(resp).await["job"].clone();
    assert_ne!(retry["id"], failed["id"]);
  }

  #[tokio::test]
  async fn unsupported_target_is_rejected() {
    let (state, _dir) = make_state(true).await;
    let token = login(&state).await;
    let doc =
      upload(&state, &token, "terms.pdf", b"%PDF-1.4 pub", "2024-01-01").await;
    let id = doc["id"].as_str().unwrap().to_string();

    let resp = send(
      state,
      "POST",
      &format!("/api/publications/{id}"),
      Some(&token),
      Some(json!({ "target": "ftp" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn unknown_job_is_404() {
    let (state, _dir) = make_state(true).await;
    let resp = send(
      state,
      "GET",
      &format!("/api/publications/jobs/{}", uuid::Uuid::new_v4()),
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
