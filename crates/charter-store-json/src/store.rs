//! [`JsonStore`] — the JSON-file implementation of [`DocumentStore`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use charter_core::{
  document::{DocumentQuery, DocumentRecord, StorageMigration},
  publication::{JobUpdate, PublicationJob},
  store::DocumentStore,
};

use crate::{Result, persist, persist::Collection};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A charter document store backed by a single JSON file.
///
/// Cloning is cheap — the inner collection is reference-counted. Every
/// mutation rewrites the whole file while holding the write lock, so
/// concurrent writers never lose updates and readers always observe a
/// consistent snapshot.
#[derive(Clone)]
pub struct JsonStore {
  path:  PathBuf,
  inner: Arc<RwLock<Collection>>,
}

impl JsonStore {
  /// Open (or create) a store at `path`, loading the full collection.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent).await?;
    }
    let collection = persist::load(&path).await?;
    let store = Self {
      path,
      inner: Arc::new(RwLock::new(collection)),
    };
    // Materialise the file so a fresh deployment starts from a valid
    // (empty) collection rather than a missing one.
    store.mutate(|_| ()).await?;
    Ok(store)
  }

  /// Mutate a copy of the collection, persist it, then commit the copy.
  /// A failed write leaves both memory and disk on the previous state.
  async fn mutate<T>(&self, f: impl FnOnce(&mut Collection) -> T) -> Result<T> {
    let mut guard = self.inner.write().await;
    let mut next = guard.clone();
    let out = f(&mut next);
    persist::save(&self.path, &next).await?;
    *guard = next;
    Ok(out)
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for JsonStore {
  type Error = crate::Error;

  async fn documents(&self) -> Result<Vec<DocumentRecord>> {
    Ok(self.inner.read().await.documents.clone())
  }

  async fn get_document(&self, id: Uuid) -> Result<Option<DocumentRecord>> {
    Ok(
      self
        .inner
        .read()
        .await
        .documents
        .iter()
        .find(|doc| doc.id == id)
        .cloned(),
    )
  }

  async fn append_document(&self, record: DocumentRecord) -> Result<()> {
    self.mutate(|c| c.documents.push(record)).await
  }

  async fn soft_delete_document(
    &self,
    id: Uuid,
  ) -> Result<Option<DocumentRecord>> {
    self
      .mutate(|c| {
        let doc = c.documents.iter_mut().find(|doc| doc.id == id)?;
        if doc.deleted_at.is_none() {
          let now = Utc::now();
          doc.deleted_at = Some(now);
          doc.updated_at = now;
        }
        Some(doc.clone())
      })
      .await
  }

  async fn migrate_storage(
    &self,
    id: Uuid,
    migration: StorageMigration,
  ) -> Result<Option<DocumentRecord>> {
    self
      .mutate(|c| {
        let doc = c.documents.iter_mut().find(|doc| doc.id == id)?;
        migration.apply(doc, Utc::now());
        Some(doc.clone())
      })
      .await
  }

  async fn query(&self, query: &DocumentQuery) -> Result<Vec<DocumentRecord>> {
    let mut matched: Vec<DocumentRecord> = self
      .inner
      .read()
      .await
      .documents
      .iter()
      .filter(|doc| query.matches(doc))
      .cloned()
      .collect();
    matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(matched)
  }

  async fn jobs(&self) -> Result<Vec<PublicationJob>> {
    Ok(self.inner.read().await.publication_jobs.clone())
  }

  async fn get_job(&self, id: Uuid) -> Result<Option<PublicationJob>> {
    Ok(
      self
        .inner
        .read()
        .await
        .publication_jobs
        .iter()
        .find(|job| job.id == id)
        .cloned(),
    )
  }

  async fn append_job(&self, job: PublicationJob) -> Result<()> {
    self.mutate(|c| c.publication_jobs.push(job)).await
  }

  async fn update_job(
    &self,
    id: Uuid,
    update: JobUpdate,
  ) -> Result<Option<PublicationJob>> {
    self
      .mutate(|c| {
        let job = c.publication_jobs.iter_mut().find(|job| job.id == id)?;
        job.status = update.status;
        if update.commit_sha.is_some() {
          job.commit_sha = update.commit_sha;
        }
        if update.pr_url.is_some() {
          job.pr_url = update.pr_url;
        }
        if update.error_message.is_some() {
          job.error_message = update.error_message;
        }
        job.updated_at = Utc::now();
        Some(job.clone())
      })
      .await
  }
}
