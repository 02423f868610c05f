//! On-disk shape of the persisted collection and its atomic replacement.

use std::path::{Path, PathBuf};

use charter_core::{document::DocumentRecord, publication::PublicationJob};
use serde::{Deserialize, Serialize};

use crate::Result;

/// The single persisted structure holding every record and job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
  #[serde(default)]
  pub documents:        Vec<DocumentRecord>,
  #[serde(default)]
  pub publication_jobs: Vec<PublicationJob>,
}

/// Read the collection; a missing file is an empty collection.
pub(crate) async fn load(path: &Path) -> Result<Collection> {
  match tokio::fs::read(path).await {
    Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      Ok(Collection::default())
    }
    Err(e) => Err(e.into()),
  }
}

/// Rewrite the collection: serialise to a sibling temp file, then rename
/// over the target. An interrupted write leaves the previous file intact.
pub(crate) async fn save(path: &Path, collection: &Collection) -> Result<()> {
  let bytes = serde_json::to_vec_pretty(collection)?;
  let swap = swap_path(path);
  tokio::fs::write(&swap, &bytes).await?;
  tokio::fs::rename(&swap, path).await?;
  Ok(())
}

fn swap_path(path: &Path) -> PathBuf {
  let mut name = path
    .file_name()
    .map(|n| n.to_os_string())
    .unwrap_or_else(|| "collection.json".into());
  name.push(".tmp");
  path.with_file_name(name)
}
