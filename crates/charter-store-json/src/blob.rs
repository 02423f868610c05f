//! [`FsBlobStore`] — directory-backed blob storage keyed by file name.

use std::path::{Path, PathBuf};

use charter_core::store::BlobStore;

use crate::Result;

/// Stores artifact bytes as files under a single root directory.
#[derive(Clone)]
pub struct FsBlobStore {
  root: PathBuf,
}

impl FsBlobStore {
  /// Open the blob root, creating it if missing.
  pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
    let root = root.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&root).await?;
    Ok(Self { root })
  }

  fn path_for(&self, name: &str) -> PathBuf {
    self.root.join(name)
  }
}

impl BlobStore for FsBlobStore {
  type Error = crate::Error;

  async fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
    Ok(tokio::fs::write(self.path_for(name), bytes).await?)
  }

  async fn get(&self, name: &str) -> Result<Vec<u8>> {
    Ok(tokio::fs::read(self.path_for(name)).await?)
  }

  async fn remove(&self, name: &str) -> Result<()> {
    match tokio::fs::remove_file(self.path_for(name)).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}
