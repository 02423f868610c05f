//! Latest-selection: the public index of current documents.
//!
//! The index is rebuilt from a full scan on every read — an explicit map,
//! never an incrementally patched structure.

use std::{cmp::Ordering, collections::BTreeMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{document::DocumentRecord, scope::DocType};

// ─── Recency ─────────────────────────────────────────────────────────────────

/// Order two records by recency: effective date first, then version, then
/// creation time. The record comparing greatest is current for its scope.
///
/// The effective date compares as a string; lexicographic order on
/// `YYYY-MM-DD` is chronological order.
pub fn compare_recency(a: &DocumentRecord, b: &DocumentRecord) -> Ordering {
  a.scope
    .effective_date
    .cmp(&b.scope.effective_date)
    .then_with(|| a.version.cmp(&b.version))
    .then_with(|| a.created_at.cmp(&b.created_at))
}

// ─── Index ───────────────────────────────────────────────────────────────────

/// One leaf of the public index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestEntry {
  pub id:             Uuid,
  pub line:           String,
  pub version:        u32,
  pub effective_date: String,
  pub sha256:         String,
  /// Stable public URL derived from the scope.
  pub url:            String,
  /// Direct download URL derived from the record id.
  pub download_url:   String,
}

/// Nested public index: platform → docType → lang → entry.
pub type LatestIndex =
  BTreeMap<String, BTreeMap<String, BTreeMap<String, LatestEntry>>>;

/// Build the public index from the full record set.
///
/// Records are grouped by (platform, line, docType, lang); the greatest
/// record under [`compare_recency`] wins each group. The published index is
/// then keyed only by (platform, docType, lang): when several lines collapse
/// onto one public key, the entry comparing greatest survives.
pub fn build_latest(documents: &[DocumentRecord]) -> LatestIndex {
  let mut winners: BTreeMap<(&str, &str, DocType, &str), &DocumentRecord> =
    BTreeMap::new();
  for doc in documents.iter().filter(|d| !d.is_deleted()) {
    let key = (
      doc.scope.platform.as_str(),
      doc.scope.line.as_str(),
      doc.scope.doc_type,
      doc.scope.lang.as_str(),
    );
    let entry = winners.entry(key).or_insert(doc);
    if compare_recency(*entry, doc) == Ordering::Less {
      *entry = doc;
    }
  }

  let mut public: BTreeMap<(&str, DocType, &str), &DocumentRecord> =
    BTreeMap::new();
  for doc in winners.into_values() {
    let key = (
      doc.scope.platform.as_str(),
      doc.scope.doc_type,
      doc.scope.lang.as_str(),
    );
    let entry = public.entry(key).or_insert(doc);
    if compare_recency(*entry, doc) == Ordering::Less {
      *entry = doc;
    }
  }

  let mut index = LatestIndex::new();
  for ((platform, doc_type, lang), doc) in public {
    index
      .entry(platform.to_string())
      .or_default()
      .entry(doc_type.to_string())
      .or_default()
      .insert(lang.to_string(), latest_entry(doc));
  }
  index
}

fn latest_entry(doc: &DocumentRecord) -> LatestEntry {
  LatestEntry {
    id:             doc.id,
    line:           doc.scope.line.clone(),
    version:        doc.version,
    effective_date: doc.scope.effective_date.clone(),
    sha256:         doc.sha256.clone(),
    url:            format!(
      "/api/public/{}_{}_{}.pdf",
      doc.scope.doc_type, doc.scope.platform, doc.scope.lang
    ),
    download_url:   format!("/api/documents/{}/download", doc.id),
  }
}

/// The current record for a public (platform, docType, lang) key, ignoring
/// the line dimension — the record behind the public PDF endpoint.
pub fn latest_for<'a>(
  documents: &'a [DocumentRecord],
  platform: &str,
  doc_type: DocType,
  lang: &str,
) -> Option<&'a DocumentRecord> {
  documents
    .iter()
    .filter(|doc| {
      !doc.is_deleted()
        && doc.scope.platform == platform
        && doc.scope.doc_type == doc_type
        && doc.scope.lang == lang
    })
    .max_by(|a, b| compare_recency(a, b))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::document::fixtures::{record, scope};

  #[test]
  fn later_effective_date_wins() {
    let older = record(scope("acme", "", "it", "2024-01-01"), 1, 0);
    let newer = record(scope("acme", "", "it", "2024-06-01"), 1, 1);

    let index = build_latest(&[older, newer.clone()]);
    let entry = &index["acme"]["terms"]["it"];
    assert_eq!(entry.id, newer.id);
    assert_eq!(entry.effective_date, "2024-06-01");
  }

  #[test]
  fn same_date_higher_version_wins() {
    let v1 = record(scope("acme", "", "it", "2024-01-01"), 1, 0);
    let v2 = record(scope("acme", "", "it", "2024-01-01"), 2, 1);

    let index = build_latest(&[v2.clone(), v1]);
    assert_eq!(index["acme"]["terms"]["it"].version, 2);
    assert_eq!(index["acme"]["terms"]["it"].id, v2.id);
  }

  #[test]
  fn same_date_and_version_later_creation_wins() {
    let early = record(scope("acme", "", "it", "2024-01-01"), 1, 0);
    let late = record(scope("acme", "", "it", "2024-01-01"), 1, 100);

    let index = build_latest(&[early, late.clone()]);
    assert_eq!(index["acme"]["terms"]["it"].id, late.id);
  }

  #[test]
  fn deleted_records_never_surface() {
    let mut doc = record(scope("acme", "", "it", "2024-01-01"), 1, 0);
    doc.deleted_at = Some(doc.created_at);
    assert!(build_latest(&[doc]).is_empty());
  }

  #[test]
  fn lines_collapse_onto_one_public_key() {
    // Two lines share (acme, terms, it); only the record comparing greatest
    // survives in the published index.
    let default_line = record(scope("acme", "", "it", "2024-01-01"), 1, 0);
    let pro_line = record(scope("acme", "pro", "it", "2024-06-01"), 1, 1);

    let index = build_latest(&[default_line, pro_line.clone()]);
    let terms = &index["acme"]["terms"];
    assert_eq!(terms.len(), 1);
    assert_eq!(terms["it"].id, pro_line.id);
    assert_eq!(terms["it"].line, "pro");
  }

  #[test]
  fn entry_urls_derive_from_scope_and_id() {
    let doc = record(scope("acme", "", "it", "2024-01-01"), 1, 0);
    let index = build_latest(std::slice::from_ref(&doc));
    let entry = &index["acme"]["terms"]["it"];
    assert_eq!(entry.url, "/api/public/terms_acme_it.pdf");
    assert_eq!(entry.download_url, format!("/api/documents/{}/download", doc.id));
  }

  #[test]
  fn index_round_trips_through_json() {
    let docs = vec![
      record(scope("acme", "", "it", "2024-01-01"), 1, 0),
      record(scope("acme", "", "en", "2024-02-01"), 1, 1),
      record(scope("globex", "pro", "it", "2024-03-01"), 2, 2),
    ];
    let index = build_latest(&docs);

    let json = serde_json::to_string(&index).unwrap();
    let parsed: LatestIndex = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, index);
  }

  #[test]
  fn latest_for_ignores_line() {
    let older = record(scope("acme", "pro", "it", "2024-01-01"), 1, 0);
    let newer = record(scope("acme", "", "it", "2024-06-01"), 1, 1);
    let docs = vec![older, newer.clone()];

    let hit = latest_for(&docs, "acme", DocType::Terms, "it").unwrap();
    assert_eq!(hit.id, newer.id);
    assert!(latest_for(&docs, "acme", DocType::Privacy, "it").is_none());
  }
}
