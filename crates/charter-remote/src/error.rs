//! Error type for `charter-remote`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("converter responded with HTTP {status}")]
  Converter { status: u16 },

  #[error("converter produced an empty document")]
  EmptyOutput,

  #[error("no conversion service is configured")]
  NoConverter,

  #[error("remote repository responded with HTTP {status}")]
  Remote { status: u16 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
