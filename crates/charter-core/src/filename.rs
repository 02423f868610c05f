//! Storage and public file-name derivation.
//!
//! Blobs are keyed `{id}_{downloadFileName}`; the public artifact for a scope
//! is `{docType}_{platform}_{lang}.pdf`.

use uuid::Uuid;

use crate::scope::Scope;

/// Sanitise a file name for blob storage.
///
/// Characters outside `[a-zA-Z0-9._-]` become `-`, runs of `-` collapse to
/// one, leading and trailing `-` are trimmed, and the result is lower-cased.
pub fn safe_file_name(name: &str) -> String {
  let replaced: String = name
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
        c
      } else {
        '-'
      }
    })
    .collect();

  let mut collapsed = String::with_capacity(replaced.len());
  for c in replaced.chars() {
    if c == '-' && collapsed.ends_with('-') {
      continue;
    }
    collapsed.push(c);
  }

  collapsed.trim_matches('-').to_lowercase()
}

/// Public download name for a scope: sanitised `{docType}_{platform}_{lang}`
/// plus the `.pdf` extension.
pub fn download_file_name(scope: &Scope) -> String {
  let base = format!("{}_{}_{}", scope.doc_type, scope.platform, scope.lang);
  format!("{}.pdf", safe_file_name(&base))
}

/// Blob key for a stored artifact.
pub fn stored_file_name(id: Uuid, download_file_name: &str) -> String {
  format!("{id}_{download_file_name}")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scope::DocType;

  #[test]
  fn punctuation_collapses_to_single_hyphens() {
    assert_eq!(
      safe_file_name("Terms & Conditions (v1).docx"),
      "terms-conditions-v1-.docx"
    );
  }

  #[test]
  fn existing_hyphen_runs_collapse_too() {
    assert_eq!(safe_file_name("a--b---c.pdf"), "a-b-c.pdf");
  }

  #[test]
  fn leading_and_trailing_hyphens_are_trimmed() {
    assert_eq!(safe_file_name("  spaced out  "), "spaced-out");
  }

  #[test]
  fn allowed_characters_survive() {
    assert_eq!(safe_file_name("Ok_name-1.2.PDF"), "ok_name-1.2.pdf");
  }

  #[test]
  fn names_derive_from_scope() {
    let scope = Scope {
      platform:       "acme".into(),
      line:           "".into(),
      doc_type:       DocType::Terms,
      lang:           "it".into(),
      effective_date: "2024-01-01".into(),
    };
    assert_eq!(download_file_name(&scope), "terms_acme_it.pdf");

    let id = Uuid::nil();
    assert_eq!(
      stored_file_name(id, "terms_acme_it.pdf"),
      format!("{id}_terms_acme_it.pdf")
    );
  }
}
