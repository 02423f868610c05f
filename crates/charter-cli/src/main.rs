//! `charter` — batch pipeline tool for the charter document service.
//!
//! # Usage
//!
//! ```
//! charter import --manifest ./manifest.json --api-base http://localhost:8787 --token $TOKEN
//! charter import --manifest ./manifest.json --dry-run
//! charter latest --api-base http://localhost:8787
//! ```

mod client;
mod manifest;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, NewUpload, UploadOutcome};
use manifest::Manifest;
use std::path::PathBuf;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "charter", about = "Batch import and publish legal documents")]
struct Args {
  /// Base URL of the charter server.
  #[arg(long, env = "CHARTER_API_BASE", default_value = "http://127.0.0.1:8787")]
  api_base: String,

  /// Bearer token for authenticated endpoints.
  #[arg(long, env = "CHARTER_TOKEN", default_value = "")]
  token: String,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Upload every entry of a manifest, optionally publishing each document.
  Import {
    /// Path to the manifest JSON (array of entries).
    #[arg(long)]
    manifest: PathBuf,

    /// Validate and report without calling the API.
    #[arg(long)]
    dry_run: bool,

    /// Queue a publication job for each uploaded document.
    #[arg(long)]
    publish: bool,
  },
  /// Print the public latest-index as JSON.
  Latest,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let client = ApiClient::new(ApiConfig {
    base_url: args.api_base.clone(),
    token:    args.token.clone(),
  })?;

  match args.command {
    Command::Import {
      manifest,
      dry_run,
      publish,
    } => import(&client, &manifest, dry_run, publish).await,
    Command::Latest => latest(&client).await,
  }
}

// ─── Import ───────────────────────────────────────────────────────────────────

async fn import(
  client: &ApiClient,
  manifest_path: &PathBuf,
  dry_run: bool,
  publish: bool,
) -> Result<()> {
  let manifest = Manifest::load(manifest_path)
    .with_context(|| format!("loading manifest {}", manifest_path.display()))?;

  println!("{} entries in manifest", manifest.entries.len());
  if dry_run {
    for entry in &manifest.entries {
      println!(
        "would upload {} -> {}/{}/{} ({})",
        entry.file_path, entry.platform, entry.doc_type, entry.lang,
        entry.effective_date
      );
    }
    return Ok(());
  }

  let mut created = 0usize;
  let mut skipped = 0usize;
  for entry in &manifest.entries {
    let content = entry
      .read_content(manifest_path)
      .with_context(|| format!("reading {}", entry.file_path))?;
    let file_name = entry.file_name();
    let outcome = client
      .upload_document(NewUpload {
        file_name:      &file_name,
        mime_type:      &entry.mime_type,
        content:        &content,
        platform:       &entry.platform,
        line:           &entry.line,
        doc_type:       &entry.doc_type,
        lang:           &entry.lang,
        effective_date: &entry.effective_date,
      })
      .await?;

    match outcome {
      UploadOutcome::Created(document) => {
        created += 1;
        println!(
          "uploaded {} as v{} ({})",
          entry.file_path, document.version, document.id
        );
        if publish {
          let job = client.create_publication(document.id).await?;
          println!("  publication {} -> {}", job.id, job.status);
        }
      }
      UploadOutcome::Duplicate(existing) => {
        skipped += 1;
        println!("skipped {} (duplicate of {existing})", entry.file_path);
      }
    }
  }

  println!("done: {created} uploaded, {skipped} skipped");
  Ok(())
}

// ─── Latest ───────────────────────────────────────────────────────────────────

async fn latest(client: &ApiClient) -> Result<()> {
  let index = client.latest().await?;
  println!("{}", serde_json::to_string_pretty(&index)?);
  Ok(())
}
