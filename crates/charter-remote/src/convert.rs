//! HTTP client for a LibreOffice-style document conversion service.

use std::time::Duration;

use charter_core::convert::{Converter, ConverterHealth};
use reqwest::multipart;

use crate::{Error, Result};

// ─── HTTP converter ──────────────────────────────────────────────────────────

/// Client for a remote conversion service exposing
/// `POST /forms/libreoffice/convert` and `GET /health`.
///
/// Conversion is the one genuinely slow call in the system; it is bounded by
/// a timeout and never retried here.
#[derive(Clone)]
pub struct HttpConverter {
  client:   reqwest::Client,
  base_url: String,
}

impl HttpConverter {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(120))
      .build()?;
    let base_url = base_url.into().trim_end_matches('/').to_string();
    Ok(Self { client, base_url })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  /// Submit `bytes` for conversion; returns the rendered PDF.
  pub async fn convert_bytes(
    &self,
    bytes: &[u8],
    original_file_name: &str,
  ) -> Result<Vec<u8>> {
    let part = multipart::Part::bytes(bytes.to_vec())
      .file_name(original_file_name.to_string());
    let form = multipart::Form::new().part("files", part);

    let response = self
      .client
      .post(self.url("/forms/libreoffice/convert"))
      .multipart(form)
      .send()
      .await?;
    if !response.status().is_success() {
      return Err(Error::Converter {
        status: response.status().as_u16(),
      });
    }

    let output = response.bytes().await?;
    if output.is_empty() {
      return Err(Error::EmptyOutput);
    }
    Ok(output.to_vec())
  }

  pub async fn health(&self) -> bool {
    match self.client.get(self.url("/health")).send().await {
      Ok(response) => response.status().is_success(),
      Err(_) => false,
    }
  }
}

// ─── Deployment selection ────────────────────────────────────────────────────

/// Converter selection for a deployment: a configured remote service, or
/// nothing — in which case non-PDF uploads fail with a typed error rather
/// than crashing the service.
#[derive(Clone)]
pub enum ConverterClient {
  Remote(HttpConverter),
  Disabled,
}

impl ConverterClient {
  /// Build from the optional configured service URL.
  pub fn from_url(url: Option<&str>) -> Result<Self> {
    match url {
      Some(url) if !url.trim().is_empty() => {
        Ok(Self::Remote(HttpConverter::new(url.trim())?))
      }
      _ => Ok(Self::Disabled),
    }
  }
}

impl Converter for ConverterClient {
  type Error = Error;

  async fn convert(
    &self,
    bytes: &[u8],
    original_file_name: &str,
  ) -> Result<Vec<u8>> {
    match self {
      Self::Remote(http) => http.convert_bytes(bytes, original_file_name).await,
      Self::Disabled => Err(Error::NoConverter),
    }
  }

  async fn probe(&self) -> ConverterHealth {
    match self {
      Self::Remote(http) => ConverterHealth {
        mode:      "remote",
        reachable: http.health().await,
      },
      Self::Disabled => ConverterHealth {
        mode:      "none",
        reachable: false,
      },
    }
  }
}
