//! Scope — the identifying tuple that groups document versions.
//!
//! A scope is (platform, line, docType, lang, effectiveDate). Raw client
//! fields are normalised once on entry; everything downstream assumes the
//! canonical form.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Document type ───────────────────────────────────────────────────────────

/// The legal document families the service publishes.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
  Terms,
  Privacy,
  Cookie,
}

impl DocType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Terms => "terms",
      Self::Privacy => "privacy",
      Self::Cookie => "cookie",
    }
  }

  /// Parse an already-lower-cased value. Returns `None` for anything else.
  pub fn parse(value: &str) -> Option<Self> {
    match value {
      "terms" => Some(Self::Terms),
      "privacy" => Some(Self::Privacy),
      "cookie" => Some(Self::Cookie),
      _ => None,
    }
  }
}

impl std::fmt::Display for DocType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Raw input ───────────────────────────────────────────────────────────────

/// Untrusted scope fields as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScope {
  #[serde(default)]
  pub platform:       String,
  #[serde(default)]
  pub line:           String,
  #[serde(default)]
  pub doc_type:       String,
  #[serde(default)]
  pub lang:           String,
  #[serde(default)]
  pub effective_date: String,
}

// ─── Scope ───────────────────────────────────────────────────────────────────

/// The canonical identifying tuple of a document version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
  pub platform:       String,
  /// Product line within the platform; empty means the default line.
  #[serde(default)]
  pub line:           String,
  pub doc_type:       DocType,
  /// Language tag, case-significant: `it` and `IT` are distinct scopes.
  pub lang:           String,
  /// `YYYY-MM-DD`. Pattern-checked only; no calendar validation.
  pub effective_date: String,
}

impl Scope {
  /// Normalise and validate raw client fields.
  ///
  /// `platform`, `line` and `docType` are trimmed and lower-cased; `lang` is
  /// trimmed but keeps its casing; `effectiveDate` must match `YYYY-MM-DD`.
  pub fn normalize(raw: &RawScope) -> Result<Self> {
    let platform = raw.platform.trim().to_lowercase();
    if platform.is_empty() {
      return Err(Error::Validation {
        field:  "platform",
        reason: "platform is required".into(),
      });
    }

    let line = raw.line.trim().to_lowercase();

    let doc_type_raw = raw.doc_type.trim().to_lowercase();
    let doc_type = DocType::parse(&doc_type_raw).ok_or(Error::Validation {
      field:  "docType",
      reason: "docType must be one of: terms, privacy, cookie".into(),
    })?;

    let lang = raw.lang.trim().to_string();
    if lang.is_empty() {
      return Err(Error::Validation {
        field:  "lang",
        reason: "lang is required".into(),
      });
    }

    let effective_date = raw.effective_date.trim().to_string();
    if !is_date_pattern(&effective_date) {
      return Err(Error::Validation {
        field:  "effectiveDate",
        reason: "effectiveDate must be YYYY-MM-DD".into(),
      });
    }

    Ok(Self {
      platform,
      line,
      doc_type,
      lang,
      effective_date,
    })
  }
}

/// `YYYY-MM-DD` shape check. Deliberately lax: digits and hyphens in the
/// right positions pass; `2024-13-40` is accepted.
fn is_date_pattern(value: &str) -> bool {
  let b = value.as_bytes();
  b.len() == 10
    && b[..4].iter().all(u8::is_ascii_digit)
    && b[4] == b'-'
    && b[5..7].iter().all(u8::is_ascii_digit)
    && b[7] == b'-'
    && b[8..10].iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw(
    platform: &str,
    line: &str,
    doc_type: &str,
    lang: &str,
    date: &str,
  ) -> RawScope {
    RawScope {
      platform:       platform.into(),
      line:           line.into(),
      doc_type:       doc_type.into(),
      lang:           lang.into(),
      effective_date: date.into(),
    }
  }

  #[test]
  fn normalize_trims_and_lowercases() {
    let scope =
      Scope::normalize(&raw("  Acme ", " Pro ", " TERMS ", " it ", "2024-01-01"))
        .unwrap();
    assert_eq!(scope.platform, "acme");
    assert_eq!(scope.line, "pro");
    assert_eq!(scope.doc_type, DocType::Terms);
    assert_eq!(scope.lang, "it");
    assert_eq!(scope.effective_date, "2024-01-01");
  }

  #[test]
  fn lang_casing_is_preserved() {
    let scope =
      Scope::normalize(&raw("acme", "", "privacy", "IT", "2024-01-01")).unwrap();
    assert_eq!(scope.lang, "IT");
  }

  #[test]
  fn empty_line_is_the_default_line() {
    let scope =
      Scope::normalize(&raw("acme", "", "cookie", "en", "2024-01-01")).unwrap();
    assert_eq!(scope.line, "");
  }

  #[test]
  fn missing_platform_is_rejected() {
    let err =
      Scope::normalize(&raw("  ", "", "terms", "it", "2024-01-01")).unwrap_err();
    assert!(matches!(err, Error::Validation { field: "platform", .. }));
  }

  #[test]
  fn unknown_doc_type_is_rejected() {
    let err =
      Scope::normalize(&raw("acme", "", "eula", "it", "2024-01-01")).unwrap_err();
    assert!(matches!(err, Error::Validation { field: "docType", .. }));
  }

  #[test]
  fn missing_lang_is_rejected() {
    let err =
      Scope::normalize(&raw("acme", "", "terms", "  ", "2024-01-01")).unwrap_err();
    assert!(matches!(err, Error::Validation { field: "lang", .. }));
  }

  #[test]
  fn slash_separated_date_is_rejected() {
    let err =
      Scope::normalize(&raw("acme", "", "TERMS", "it", "2024/01/01")).unwrap_err();
    assert!(matches!(err, Error::Validation { field: "effectiveDate", .. }));
  }

  #[test]
  fn date_pattern_is_lax_about_calendar_validity() {
    // The shape is all that is checked; impossible dates pass through.
    let scope =
      Scope::normalize(&raw("acme", "", "terms", "it", "2024-13-40")).unwrap();
    assert_eq!(scope.effective_date, "2024-13-40");
  }

  #[test]
  fn short_date_is_rejected() {
    let err =
      Scope::normalize(&raw("acme", "", "terms", "it", "2024-1-1")).unwrap_err();
    assert!(matches!(err, Error::Validation { field: "effectiveDate", .. }));
  }
}
