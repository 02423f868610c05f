//! Publication jobs — asynchronous publishing of a document to the public
//! repository via a pull-request workflow.
//!
//! A job is a small state machine: `queued -> running -> pr_open -> merged`,
//! with any non-terminal state able to drop to `failed`. Terminal states
//! never transition again; a retry is a new job.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  document::DocumentRecord,
  store::{BlobStore, DocumentStore},
};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
  Queued,
  Running,
  PrOpen,
  Merged,
  Failed,
}

impl JobStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Queued => "queued",
      Self::Running => "running",
      Self::PrOpen => "pr_open",
      Self::Merged => "merged",
      Self::Failed => "failed",
    }
  }

  /// Terminal states admit no further transitions.
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Merged | Self::Failed)
  }

  /// Active states block creation of another job for the same document.
  pub fn is_active(&self) -> bool {
    matches!(self, Self::Queued | Self::Running | Self::PrOpen)
  }

  /// Whether moving from `self` to `next` is legal.
  pub fn can_transition(&self, next: JobStatus) -> bool {
    match (self, next) {
      (Self::Queued, Self::Running) => true,
      (Self::Running, Self::PrOpen) => true,
      (Self::PrOpen, Self::Merged) => true,
      (from, Self::Failed) => !from.is_terminal(),
      _ => false,
    }
  }
}

impl std::fmt::Display for JobStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Job record ──────────────────────────────────────────────────────────────

/// One publication attempt for one document. Holds a weak reference to the
/// document by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationJob {
  pub id:            Uuid,
  pub document_id:   Uuid,
  /// Fixed at creation from the document's scope and version.
  pub target_repo:   String,
  pub target_branch: String,
  pub status:        JobStatus,
  pub strategy:      String,
  #[serde(default)]
  pub commit_sha:    Option<String>,
  #[serde(default)]
  pub pr_url:        Option<String>,
  #[serde(default)]
  pub error_message: Option<String>,
  pub created_by:    String,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl PublicationJob {
  /// Queue a new job for `document`, deriving the target branch from its
  /// scope and version.
  pub fn for_document(
    document: &DocumentRecord,
    target_repo: &str,
    created_by: &str,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id:            Uuid::new_v4(),
      document_id:   document.id,
      target_repo:   target_repo.to_string(),
      target_branch: format!(
        "publish/{}/{}/{}/{}",
        document.scope.platform,
        document.scope.doc_type,
        document.scope.lang,
        document.version
      ),
      status:        JobStatus::Queued,
      strategy:      "pull-request".to_string(),
      commit_sha:    None,
      pr_url:        None,
      error_message: None,
      created_by:    created_by.to_string(),
      created_at:    now,
      updated_at:    now,
    }
  }

  pub fn is_terminal(&self) -> bool {
    self.status.is_terminal()
  }
}

// ─── Transition payload ──────────────────────────────────────────────────────

/// Fields attached while advancing a job. `None` fields keep their current
/// values.
#[derive(Debug, Clone)]
pub struct JobUpdate {
  pub status:        JobStatus,
  pub commit_sha:    Option<String>,
  pub pr_url:        Option<String>,
  pub error_message: Option<String>,
}

impl JobUpdate {
  pub fn to(status: JobStatus) -> Self {
    Self {
      status,
      commit_sha: None,
      pr_url: None,
      error_message: None,
    }
  }
}

// ─── Target ──────────────────────────────────────────────────────────────────

/// The remote end of a publication: a repository accepting a commit and a
/// pull request. Implementations live outside this crate.
pub trait PublicationTarget: Send + Sync {
  type Error: std::fmt::Display + Send + Sync + 'static;

  /// Push the rendered artifact to the job's target branch; returns the
  /// commit sha.
  fn push_document<'a>(
    &'a self,
    job: &'a PublicationJob,
    document: &'a DocumentRecord,
    pdf: Vec<u8>,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Open the pull request for the pushed branch; returns the PR URL.
  fn open_pull_request<'a>(
    &'a self,
    job: &'a PublicationJob,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}

// ─── Workflows ───────────────────────────────────────────────────────────────

/// Create a job for `document_id`, enforcing the one-active-job invariant.
///
/// Fails with [`Error::ActiveJobExists`] (carrying the blocking job's id)
/// when a queued, running or pr_open job already references the document.
pub async fn create_publication<S>(
  store: &S,
  document_id: Uuid,
  target_repo: &str,
  created_by: &str,
) -> Result<PublicationJob>
where
  S: DocumentStore,
{
  let document = store
    .get_document(document_id)
    .await
    .map_err(Error::storage)?
    .filter(|doc| !doc.is_deleted())
    .ok_or(Error::DocumentNotFound(document_id))?;

  let jobs = store.jobs().await.map_err(Error::storage)?;
  if let Some(active) = jobs
    .iter()
    .find(|job| job.document_id == document_id && job.status.is_active())
  {
    return Err(Error::ActiveJobExists {
      document_id,
      job_id: active.id,
    });
  }

  let job =
    PublicationJob::for_document(&document, target_repo, created_by, Utc::now());
  store.append_job(job.clone()).await.map_err(Error::storage)?;
  Ok(job)
}

/// Drive a queued job through the worker path.
///
/// Advances `queued -> running -> pr_open`, attaching the commit sha and PR
/// URL as the target produces them. A step failure parks the job in `failed`
/// with the reason and returns the step error; there is no retry at this
/// layer.
pub async fn run_publication<S, B, P>(
  store: &S,
  blobs: &B,
  target: &P,
  job_id: Uuid,
) -> Result<PublicationJob>
where
  S: DocumentStore,
  B: BlobStore,
  P: PublicationTarget,
{
  let job = store
    .get_job(job_id)
    .await
    .map_err(Error::storage)?
    .ok_or(Error::JobNotFound(job_id))?;
  let job = advance(store, &job, JobUpdate::to(JobStatus::Running)).await?;

  match publish_steps(store, blobs, target, job.clone()).await {
    Ok(done) => Ok(done),
    Err(step_err) => {
      let mut update = JobUpdate::to(JobStatus::Failed);
      update.error_message = Some(step_err.to_string());
      // The step error is what the caller must see, even if parking the job
      // fails too.
      let _ = advance(store, &job, update).await;
      Err(step_err)
    }
  }
}

/// Record an external merge confirmation: `pr_open -> merged`.
pub async fn confirm_merge<S>(store: &S, job_id: Uuid) -> Result<PublicationJob>
where
  S: DocumentStore,
{
  let job = store
    .get_job(job_id)
    .await
    .map_err(Error::storage)?
    .ok_or(Error::JobNotFound(job_id))?;
  advance(store, &job, JobUpdate::to(JobStatus::Merged)).await
}

async fn publish_steps<S, B, P>(
  store: &S,
  blobs: &B,
  target: &P,
  job: PublicationJob,
) -> Result<PublicationJob>
where
  S: DocumentStore,
  B: BlobStore,
  P: PublicationTarget,
{
  let document = store
    .get_document(job.document_id)
    .await
    .map_err(Error::storage)?
    .ok_or(Error::DocumentNotFound(job.document_id))?;
  let pdf = blobs
    .get(&document.stored_file_name)
    .await
    .map_err(Error::storage)?;

  let commit_sha = target
    .push_document(&job, &document, pdf)
    .await
    .map_err(|e| Error::Publication(e.to_string()))?;
  let mut update = JobUpdate::to(JobStatus::Running);
  update.commit_sha = Some(commit_sha);
  let job = advance(store, &job, update).await?;

  let pr_url = target
    .open_pull_request(&job)
    .await
    .map_err(|e| Error::Publication(e.to_string()))?;
  let mut update = JobUpdate::to(JobStatus::PrOpen);
  update.pr_url = Some(pr_url);
  advance(store, &job, update).await
}

/// Apply `update`, refusing illegal status changes. Re-asserting the current
/// status of a live job only attaches fields; terminal jobs accept nothing.
async fn advance<S>(
  store: &S,
  job: &PublicationJob,
  update: JobUpdate,
) -> Result<PublicationJob>
where
  S: DocumentStore,
{
  if job.status.is_terminal()
    || (update.status != job.status && !job.status.can_transition(update.status))
  {
    return Err(Error::InvalidTransition {
      from: job.status,
      to:   update.status,
    });
  }
  store
    .update_job(job.id, update)
    .await
    .map_err(Error::storage)?
    .ok_or(Error::JobNotFound(job.id))
}
