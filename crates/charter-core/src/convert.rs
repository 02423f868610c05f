//! The external document-to-PDF converter contract.
//!
//! The converter is an opaque, potentially slow, potentially absent
//! collaborator. Absence surfaces as an error from [`Converter::convert`],
//! never as a panic.

use std::{future::Future, path::Path};

use serde::Serialize;

// ─── Health ──────────────────────────────────────────────────────────────────

/// Result of probing the converter, reported by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ConverterHealth {
  /// `"remote"` when a conversion service is configured, `"none"` otherwise.
  pub mode:      &'static str,
  pub reachable: bool,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// An external converter rendering uploaded bytes to PDF.
pub trait Converter: Send + Sync {
  type Error: std::fmt::Display + Send + Sync + 'static;

  /// Convert `bytes` (originally named `original_file_name`) to PDF.
  fn convert<'a>(
    &'a self,
    bytes: &'a [u8],
    original_file_name: &'a str,
  ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send + 'a;

  /// Probe availability for health reporting.
  fn probe(&self) -> impl Future<Output = ConverterHealth> + Send + '_;
}

/// Whether an uploaded file needs conversion before storage. PDF uploads
/// pass through untouched.
pub fn needs_conversion(file_name: &str) -> bool {
  !Path::new(file_name)
    .extension()
    .map(|ext| ext.eq_ignore_ascii_case("pdf"))
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pdf_extensions_skip_conversion() {
    assert!(!needs_conversion("contract.pdf"));
    assert!(!needs_conversion("contract.PDF"));
  }

  #[test]
  fn other_extensions_need_conversion() {
    assert!(needs_conversion("contract.docx"));
    assert!(needs_conversion("contract.pages"));
    assert!(needs_conversion("contract.rtf"));
    assert!(needs_conversion("no-extension"));
  }
}
