//! Document records — the fundamental unit of the charter store.
//!
//! A record is created once by a successful upload and mutated only by
//! soft-deletion or storage migration. It is never removed from the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scope::Scope;

// ─── Record ──────────────────────────────────────────────────────────────────

/// A published artifact and its identifying scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
  pub id:                 Uuid,
  pub original_file_name: String,
  /// Public-facing name, `{docType}_{platform}_{lang}.pdf`.
  pub download_file_name: String,
  /// Blob key, `{id}_{downloadFileName}`.
  pub stored_file_name:   String,
  /// MIME type of the uploaded bytes, before any conversion.
  pub original_mime_type: String,
  /// Digest of the uploaded bytes; absent on legacy records.
  #[serde(default)]
  pub source_sha256:      Option<String>,
  pub mime_type:          String,
  pub size_bytes:         u64,
  /// Digest of the rendered PDF artifact.
  pub sha256:             String,
  #[serde(flatten)]
  pub scope:              Scope,
  /// Monotonic within the scope, starting at 1.
  pub version:            u32,
  pub converted_to_pdf:   bool,
  pub created_at:         DateTime<Utc>,
  pub updated_at:         DateTime<Utc>,
  /// Set once by soft-deletion, never cleared.
  #[serde(default)]
  pub deleted_at:         Option<DateTime<Utc>>,
}

impl DocumentRecord {
  pub fn is_deleted(&self) -> bool {
    self.deleted_at.is_some()
  }
}

// ─── Storage migration ───────────────────────────────────────────────────────

/// Replacement storage fields applied when a legacy record's content is
/// converted to PDF after the fact. Identity, scope and version are kept.
#[derive(Debug, Clone)]
pub struct StorageMigration {
  pub stored_file_name:   String,
  pub download_file_name: String,
  pub mime_type:          String,
  pub size_bytes:         u64,
  pub sha256:             String,
}

impl StorageMigration {
  /// Apply to `record` in place, stamping `updated_at`.
  pub fn apply(self, record: &mut DocumentRecord, now: DateTime<Utc>) {
    record.stored_file_name = self.stored_file_name;
    record.download_file_name = self.download_file_name;
    record.mime_type = self.mime_type;
    record.size_bytes = self.size_bytes;
    record.sha256 = self.sha256;
    record.converted_to_pdf = true;
    record.updated_at = now;
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::DocumentStore::query`].
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
  /// Exact match on the (lower-cased) platform.
  pub platform:        Option<String>,
  /// Exact match on the line. `None` means any line; the default (empty)
  /// line cannot be selected for on its own.
  pub line:            Option<String>,
  pub doc_type:        Option<String>,
  /// Exact, case-sensitive match.
  pub lang:            Option<String>,
  pub effective_date:  Option<String>,
  /// Case-insensitive substring over file name, platform, docType and lang.
  pub search:          Option<String>,
  /// Soft-deleted records are excluded unless set.
  pub include_deleted: bool,
}

impl DocumentQuery {
  pub fn matches(&self, doc: &DocumentRecord) -> bool {
    if !self.include_deleted && doc.is_deleted() {
      return false;
    }
    if let Some(p) = &self.platform
      && doc.scope.platform != *p
    {
      return false;
    }
    if let Some(l) = &self.line
      && doc.scope.line != *l
    {
      return false;
    }
    if let Some(t) = &self.doc_type
      && doc.scope.doc_type.as_str() != t
    {
      return false;
    }
    if let Some(l) = &self.lang
      && doc.scope.lang != *l
    {
      return false;
    }
    if let Some(d) = &self.effective_date
      && doc.scope.effective_date != *d
    {
      return false;
    }
    if let Some(s) = &self.search {
      let haystack = format!(
        "{} {} {} {}",
        doc.original_file_name,
        doc.scope.platform,
        doc.scope.doc_type,
        doc.scope.lang
      )
      .to_lowercase();
      if !haystack.contains(&s.to_lowercase()) {
        return false;
      }
    }
    true
  }
}

// ─── Version assignment ──────────────────────────────────────────────────────

/// Next version for `scope`: one past the highest version ever assigned in
/// the scope. Soft-deleted records still count, so deleting and re-uploading
/// never reuses a version number.
pub fn next_version(documents: &[DocumentRecord], scope: &Scope) -> u32 {
  documents
    .iter()
    .filter(|doc| doc.scope == *scope)
    .map(|doc| doc.version)
    .max()
    .unwrap_or(0)
    + 1
}

// ─── Duplicate detection ─────────────────────────────────────────────────────

/// Find an active record in `scope` carrying the same content.
///
/// A duplicate matches on the source digest (when the stored record has one)
/// or on the rendered-PDF digest. The first match in insertion order wins.
pub fn find_duplicate<'a>(
  documents: &'a [DocumentRecord],
  scope: &Scope,
  source_sha256: &str,
  sha256: &str,
) -> Option<&'a DocumentRecord> {
  documents.iter().find(|doc| {
    if doc.is_deleted() || doc.scope != *scope {
      return false;
    }
    let same_source = doc.source_sha256.as_deref() == Some(source_sha256);
    let same_pdf = doc.sha256 == sha256;
    same_source || same_pdf
  })
}

#[cfg(test)]
pub(crate) mod fixtures {
  use super::*;
  use crate::scope::DocType;
  use chrono::TimeZone;

  pub fn scope(platform: &str, line: &str, lang: &str, date: &str) -> Scope {
    Scope {
      platform:       platform.into(),
      line:           line.into(),
      doc_type:       DocType::Terms,
      lang:           lang.into(),
      effective_date: date.into(),
    }
  }

  pub fn record(scope: Scope, version: u32, created_secs: i64) -> DocumentRecord {
    let ts = Utc.timestamp_opt(created_secs, 0).unwrap();
    DocumentRecord {
      id: Uuid::new_v4(),
      original_file_name: "upload.docx".into(),
      download_file_name: "terms_acme_it.pdf".into(),
      stored_file_name: "blob.pdf".into(),
      original_mime_type: "application/octet-stream".into(),
      source_sha256: None,
      mime_type: "application/pdf".into(),
      size_bytes: 4,
      sha256: format!("sha-{version}-{created_secs}"),
      scope,
      version,
      converted_to_pdf: true,
      created_at: ts,
      updated_at: ts,
      deleted_at: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::fixtures::{record, scope};
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn first_version_in_a_scope_is_one() {
    assert_eq!(next_version(&[], &scope("acme", "", "it", "2024-01-01")), 1);
  }

  #[test]
  fn versions_count_past_the_maximum() {
    let s = scope("acme", "", "it", "2024-01-01");
    let docs = vec![record(s.clone(), 1, 0), record(s.clone(), 2, 1)];
    assert_eq!(next_version(&docs, &s), 3);
  }

  #[test]
  fn deleted_records_still_reserve_their_versions() {
    let s = scope("acme", "", "it", "2024-01-01");
    let mut doc = record(s.clone(), 3, 0);
    doc.deleted_at = Some(Utc.timestamp_opt(10, 0).unwrap());
    assert_eq!(next_version(&[doc], &s), 4);
  }

  #[test]
  fn versions_are_scope_local() {
    let s = scope("acme", "", "it", "2024-01-01");
    let other = record(scope("acme", "", "it", "2024-06-01"), 7, 0);
    assert_eq!(next_version(&[other], &s), 1);
  }

  #[test]
  fn duplicate_by_rendered_hash() {
    let s = scope("acme", "", "it", "2024-01-01");
    let existing = record(s.clone(), 1, 0);
    let hit = find_duplicate(
      std::slice::from_ref(&existing),
      &s,
      "other-source",
      &existing.sha256,
    );
    assert_eq!(hit.map(|d| d.id), Some(existing.id));
  }

  #[test]
  fn duplicate_by_source_hash() {
    let s = scope("acme", "", "it", "2024-01-01");
    let mut existing = record(s.clone(), 1, 0);
    existing.source_sha256 = Some("src-digest".into());
    let hit =
      find_duplicate(std::slice::from_ref(&existing), &s, "src-digest", "other");
    assert_eq!(hit.map(|d| d.id), Some(existing.id));
  }

  #[test]
  fn deleted_records_are_not_duplicates() {
    let s = scope("acme", "", "it", "2024-01-01");
    let mut existing = record(s.clone(), 1, 0);
    existing.deleted_at = Some(Utc.timestamp_opt(10, 0).unwrap());
    let sha = existing.sha256.clone();
    assert!(find_duplicate(&[existing], &s, "x", &sha).is_none());
  }

  #[test]
  fn other_scopes_are_not_duplicates() {
    let s = scope("acme", "", "it", "2024-01-01");
    let existing = record(scope("acme", "", "it", "2024-06-01"), 1, 0);
    let sha = existing.sha256.clone();
    assert!(find_duplicate(&[existing], &s, "x", &sha).is_none());
  }

  #[test]
  fn query_default_excludes_deleted() {
    let s = scope("acme", "", "it", "2024-01-01");
    let mut doc = record(s, 1, 0);
    doc.deleted_at = Some(Utc.timestamp_opt(10, 0).unwrap());

    assert!(!DocumentQuery::default().matches(&doc));
    let include = DocumentQuery {
      include_deleted: true,
      ..Default::default()
    };
    assert!(include.matches(&doc));
  }

  #[test]
  fn query_filters_on_scope_fields() {
    let doc = record(scope("acme", "pro", "it", "2024-01-01"), 1, 0);

    let by_platform = DocumentQuery {
      platform: Some("acme".into()),
      ..Default::default()
    };
    assert!(by_platform.matches(&doc));

    let wrong_platform = DocumentQuery {
      platform: Some("globex".into()),
      ..Default::default()
    };
    assert!(!wrong_platform.matches(&doc));

    let by_type = DocumentQuery {
      doc_type: Some("terms".into()),
      ..Default::default()
    };
    assert!(by_type.matches(&doc));

    let by_date = DocumentQuery {
      effective_date: Some("2024-01-01".into()),
      ..Default::default()
    };
    assert!(by_date.matches(&doc));

    let wrong_date = DocumentQuery {
      effective_date: Some("2024-06-01".into()),
      ..Default::default()
    };
    assert!(!wrong_date.matches(&doc));
  }

  #[test]
  fn query_search_is_case_insensitive_substring() {
    let mut doc = record(scope("acme", "", "it", "2024-01-01"), 1, 0);
    doc.original_file_name = "Terms 2024 FINAL.docx".into();

    let hit = DocumentQuery {
      search: Some("final".into()),
      ..Default::default()
    };
    assert!(hit.matches(&doc));

    let miss = DocumentQuery {
      search: Some("privacy".into()),
      ..Default::default()
    };
    assert!(!miss.matches(&doc));
  }
}
