//! Session issuance and validation — the authorization seam for mutating
//! routes.
//!
//! An explicit store with issue/validate/revoke semantics, injected into the
//! request layer. The domain core never sees it.

use std::collections::HashMap;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// An issued login session.
#[derive(Debug, Clone)]
pub struct Session {
  pub username:  String,
  pub issued_at: DateTime<Utc>,
}

/// In-memory session store keyed by opaque bearer tokens.
#[derive(Default)]
pub struct SessionStore {
  sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Issue a fresh opaque bearer token for `username`.
  pub async fn issue(&self, username: &str) -> String {
    let token = Uuid::new_v4().to_string();
    self.sessions.write().await.insert(token.clone(), Session {
      username:  username.to_string(),
      issued_at: Utc::now(),
    });
    token
  }

  /// Look up the session behind `token`.
  pub async fn validate(&self, token: &str) -> Option<Session> {
    self.sessions.read().await.get(token).cloned()
  }

  /// Revoke a token. Unknown tokens are ignored.
  pub async fn revoke(&self, token: &str) {
    self.sessions.write().await.remove(token);
  }
}

/// Verify `password` against an argon2 PHC string (`$argon2id$v=19$…`).
pub fn verify_password(password: &str, password_hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(password_hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}
