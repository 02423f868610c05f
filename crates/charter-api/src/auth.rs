//! Handlers for `/api/auth` endpoints and the bearer-token gate used by
//! mutating routes.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/auth/login` | Body: `{"username","password"}`; returns a bearer token |
//! | `GET`  | `/api/auth/me` | Session behind the presented token |
//! | `POST` | `/api/auth/logout` | Revokes the presented token |

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use charter_core::store::DocumentStore;
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiError, session};

/// Extract the bearer token from the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, token) = value.split_once(' ')?;
  if !scheme.eq_ignore_ascii_case("bearer") {
    return None;
  }
  let token = token.trim();
  (!token.is_empty()).then(|| token.to_string())
}

/// Gate for mutating routes: returns the acting username.
///
/// When login is disabled by configuration every request acts as
/// `"anonymous"`; otherwise a valid session token is required.
pub async fn require<S>(
  state: &AppState<S>,
  headers: &HeaderMap,
) -> Result<String, ApiError>
where
  S: DocumentStore + Clone + Send + Sync + 'static,
{
  if !state.config.require_login {
    return Ok("anonymous".to_string());
  }
  let token = bearer_token(headers)
    .ok_or_else(|| ApiError::Unauthorized("login required".into()))?;
  let session = state
    .sessions
    .validate(&token)
    .await
    .ok_or_else(|| ApiError::Unauthorized("invalid or expired token".into()))?;
  Ok(session.username)
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub password: String,
}

/// `POST /api/auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + Send + Sync + 'static,
{
  let username = body.username.trim();
  let password = body.password.trim();
  if username.is_empty() || password.is_empty() {
    return Err(ApiError::BadRequest(
      "username and password are required".into(),
    ));
  }

  if username != state.config.auth_username
    || !session::verify_password(password, &state.config.auth_password_hash)
  {
    return Err(ApiError::Unauthorized("invalid credentials".into()));
  }

  let token = state.sessions.issue(username).await;
  Ok(Json(json!({
    "token": token,
    "user": { "username": username },
  })))
}

// ─── Me ───────────────────────────────────────────────────────────────────────

/// `GET /api/auth/me`
pub async fn me<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + Send + Sync + 'static,
{
  let token = bearer_token(&headers)
    .ok_or_else(|| ApiError::Unauthorized("authorization required".into()))?;
  let session = state
    .sessions
    .validate(&token)
    .await
    .ok_or_else(|| ApiError::Unauthorized("invalid or expired token".into()))?;
  Ok(Json(json!({ "user": { "username": session.username } })))
}

// ─── Logout ───────────────────────────────────────────────────────────────────

/// `POST /api/auth/logout` — idempotent.
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + Send + Sync + 'static,
{
  if let Some(token) = bearer_token(&headers) {
    state.sessions.revoke(&token).await;
  }
  Ok(StatusCode::NO_CONTENT)
}
