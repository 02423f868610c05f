//! charter server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! JSON document store and blob directory, wires the configured converter
//! and publication target, and serves the JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash` in config.toml:
//!
//! ```
//! cargo run -p charter-api --bin server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use charter_api::{AppState, ServerConfig, SessionStore};
use charter_remote::{ConverterClient, Publisher};
use charter_store_json::{FsBlobStore, JsonStore};
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Charter legal-document publishing server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CHARTER"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in storage paths.
  let data_file = expand_tilde(&server_cfg.data_file);
  let storage_dir = expand_tilde(&server_cfg.storage_dir);

  // Open the persisted collection and blob root.
  let store = JsonStore::open(&data_file)
    .await
    .with_context(|| format!("failed to open store at {data_file:?}"))?;
  let blobs = FsBlobStore::open(&storage_dir)
    .await
    .with_context(|| format!("failed to open blob store at {storage_dir:?}"))?;

  // External collaborators, selected by configuration.
  let converter = ConverterClient::from_url(server_cfg.converter_url.as_deref())
    .context("failed to build converter client")?;
  let publisher = Publisher::from_token(server_cfg.publish_token.as_deref())
    .context("failed to build publication target")?;

  // Build application state.
  let state = AppState {
    store:     Arc::new(store),
    blobs:     Arc::new(blobs),
    converter: Arc::new(converter),
    publisher: Arc::new(publisher),
    sessions:  Arc::new(SessionStore::new()),
    config:    Arc::new(server_cfg.clone()),
  };

  let app = charter_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
