//! Selection-list classification lookups.
//!
//! A result type points at a classification in an external reference-data
//! service by URL. The HTTP layer resolves every URL a request needs before
//! the storage transaction starts and hands the results to the validators in
//! a [`ResolvedClassifications`] cache, so validation itself never performs
//! I/O.

use std::{collections::HashMap, future::Future};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ErrorCode, ValidationError};

/// Process term that only fits derivation method `afgehandeld`.
pub const PROCESS_TERM_CASE_CLOSED: &str = "nihil";
/// Process term that only fits derivation method `termijn`.
pub const PROCESS_TERM_ESTIMATED_LIFETIME: &str =
  "ingeschatte_bestaansduur_procesobject";

/// The slice of a classification the validators care about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
  pub url:          String,
  #[serde(rename = "procesType")]
  pub process_type: String,
  #[serde(rename = "procestermijn", default)]
  pub process_term: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
  #[error("request failed: {0}")]
  Transport(String),
  #[error("request timed out")]
  Timeout,
  #[error("unexpected status {0}")]
  Status(u16),
  #[error("malformed response: {0}")]
  Malformed(String),
}

/// Resolves a classification URL. Failures are never retried.
pub trait ClassificationClient: Send + Sync {
  fn resolve<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<Classification, LookupError>> + Send + 'a;
}

/// Per-request cache of lookup outcomes, keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct ResolvedClassifications {
  entries: HashMap<String, Result<Classification, LookupError>>,
}

impl ResolvedClassifications {
  pub fn new() -> Self { Self::default() }

  /// Resolve `url` through `client` unless an outcome is already cached.
  pub async fn prefetch<C>(&mut self, client: &C, url: &str)
  where
    C: ClassificationClient + ?Sized,
  {
    if self.entries.contains_key(url) {
      return;
    }
    let outcome = client.resolve(url).await;
    self.entries.insert(url.to_owned(), outcome);
  }

  /// Record a successful lookup directly.
  pub fn insert(&mut self, classification: Classification) {
    self
      .entries
      .insert(classification.url.clone(), Ok(classification));
  }

  /// Record a failed lookup directly.
  pub fn insert_failure(&mut self, url: impl Into<String>, err: LookupError) {
    self.entries.insert(url.into(), Err(err));
  }

  /// The cached classification for `url`. A failed or missing lookup is an
  /// `invalid-resource` error on `field`.
  pub fn get(
    &self,
    url: &str,
    field: &str,
  ) -> Result<&Classification, ValidationError> {
    match self.entries.get(url) {
      Some(Ok(classification)) => Ok(classification),
      Some(Err(err)) => Err(ValidationError::new(
        field,
        ErrorCode::InvalidResource,
        format!("could not resolve {url}: {err}"),
      )),
      None => Err(ValidationError::new(
        field,
        ErrorCode::InvalidResource,
        format!("{url} was not resolved"),
      )),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Fixed(Classification);

  impl ClassificationClient for Fixed {
    async fn resolve(&self, url: &str) -> Result<Classification, LookupError> {
      if url == self.0.url {
        Ok(self.0.clone())
      } else {
        Err(LookupError::Status(404))
      }
    }
  }

  fn classification() -> Classification {
    Classification {
      url:          "https://selectielijst.example/resultaten/1".into(),
      process_type: "https://selectielijst.example/procestypen/1".into(),
      process_term: PROCESS_TERM_CASE_CLOSED.into(),
    }
  }

  #[test]
  fn deserializes_the_reference_service_payload() {
    let c: Classification = serde_json::from_str(
      r#"{
        "url": "https://selectielijst.example/resultaten/1",
        "procesType": "https://selectielijst.example/procestypen/1",
        "nummer": 1,
        "procestermijn": "nihil"
      }"#,
    )
    .unwrap();
    assert_eq!(c, classification());
  }

  #[tokio::test]
  async fn prefetch_caches_hits_and_failures() {
    let client = Fixed(classification());
    let mut resolved = ResolvedClassifications::new();
    resolved.prefetch(&client, &classification().url).await;
    resolved.prefetch(&client, "https://selectielijst.example/missing").await;

    assert!(resolved.get(&classification().url, "selection_list_class").is_ok());
    let err = resolved
      .get("https://selectielijst.example/missing", "selection_list_class")
      .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidResource);
    assert_eq!(err.field_path, "selection_list_class");
  }

  #[test]
  fn unresolved_urls_are_invalid_resources() {
    let resolved = ResolvedClassifications::new();
    let err = resolved.get("https://nowhere", "selection_list_class").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidResource);
  }
}
