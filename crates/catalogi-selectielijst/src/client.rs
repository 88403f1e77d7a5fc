//! Async HTTP client for classification lookups.

use std::{future::Future, time::Duration};

use catalogi_core::classification::{
  Classification, ClassificationClient, LookupError,
};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// Settings for [`SelectielijstClient`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  /// Upper bound on a whole lookup, connect to last byte.
  pub timeout_secs: u64,
}

impl Default for ClientConfig {
  fn default() -> Self { Self { timeout_secs: 10 } }
}

impl ClientConfig {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("failed to build HTTP client: {0}")]
  Build(#[from] reqwest::Error),
}

/// The fields of a selection-list result the validators need. The URL is
/// taken from the request, not the body.
#[derive(Deserialize)]
struct WireResult {
  #[serde(rename = "procesType")]
  process_type: String,
  #[serde(rename = "procestermijn", default)]
  process_term: Option<String>,
}

/// Resolves classification URLs against the selection-list service.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct SelectielijstClient {
  client: Client,
}

impl SelectielijstClient {
  pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
    let client = Client::builder().timeout(config.timeout()).build()?;
    Ok(Self { client })
  }

  /// `GET <url>`, decoded into a [`Classification`]. Never retried.
  pub async fn fetch(&self, url: &str) -> Result<Classification, LookupError> {
    let resp = self.client.get(url).send().await.map_err(lookup_error)?;

    let status = resp.status();
    if !status.is_success() {
      tracing::warn!(%url, %status, "classification lookup rejected");
      return Err(LookupError::Status(status.as_u16()));
    }

    let wire: WireResult = resp.json().await.map_err(lookup_error)?;
    tracing::debug!(%url, process_type = %wire.process_type, "resolved classification");
    Ok(Classification {
      url:          url.to_owned(),
      process_type: wire.process_type,
      process_term: wire.process_term.unwrap_or_default(),
    })
  }
}

fn lookup_error(err: reqwest::Error) -> LookupError {
  if err.is_timeout() {
    tracing::warn!(error = %err, "classification lookup timed out");
    LookupError::Timeout
  } else if err.is_decode() {
    LookupError::Malformed(err.to_string())
  } else {
    tracing::warn!(error = %err, "classification lookup failed");
    LookupError::Transport(err.to_string())
  }
}

impl ClassificationClient for SelectielijstClient {
  fn resolve<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<Classification, LookupError>> + Send + 'a {
    self.fetch(url)
  }
}
