//! Manifest loading and validation for batch import.
//!
//! A manifest is a JSON array of entries, each pointing at a source file and
//! carrying the scope it should be filed under. Entries are validated with
//! the same rules the server applies, so a bad manifest fails before any
//! upload starts.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};
use charter_core::scope::{RawScope, Scope};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
  pub file_path:      String,
  pub platform:       String,
  #[serde(default)]
  pub line:           String,
  pub doc_type:       String,
  pub lang:           String,
  pub effective_date: String,
  #[serde(default = "default_mime")]
  pub mime_type:      String,
}

fn default_mime() -> String {
  "application/octet-stream".to_string()
}

#[derive(Debug)]
pub struct Manifest {
  pub entries: Vec<ManifestEntry>,
}

impl Manifest {
  pub fn load(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)?;
    Self::parse(&raw)
  }

  pub fn parse(raw: &str) -> Result<Self> {
    let entries: Vec<ManifestEntry> = serde_json::from_str(raw)?;
    for (index, entry) in entries.iter().enumerate() {
      entry.validate(index)?;
    }
    Ok(Self { entries })
  }
}

impl ManifestEntry {
  fn validate(&self, index: usize) -> Result<()> {
    if self.file_path.trim().is_empty() {
      bail!("entry {index}: missing required field 'filePath'");
    }
    Scope::normalize(&RawScope {
      platform:       self.platform.clone(),
      line:           self.line.clone(),
      doc_type:       self.doc_type.clone(),
      lang:           self.lang.clone(),
      effective_date: self.effective_date.clone(),
    })
    .map_err(|e| anyhow!("entry {index}: {e}"))?;
    Ok(())
  }

  /// Source bytes, resolved relative to the manifest's directory.
  pub fn read_content(&self, manifest_path: &Path) -> Result<Vec<u8>> {
    let path = PathBuf::from(&self.file_path);
    let abs = if path.is_absolute() {
      path
    } else {
      manifest_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(path)
    };
    Ok(std::fs::read(abs)?)
  }

  pub fn file_name(&self) -> String {
    Path::new(&self.file_path)
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| self.file_path.clone())
  }
}
