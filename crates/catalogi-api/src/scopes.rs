//! Caller scopes, read from a request header set by the authenticating proxy.

use axum::{extract::FromRequestParts, http::request::Parts};
use catalogi_core::{Scope, Scopes};

use crate::error::ApiError;

/// Header carrying the caller's scopes, comma- or space-separated.
pub const SCOPES_HEADER: &str = "x-catalogi-scopes";

/// Any scope lets a caller read.
pub const READ: &[Scope] =
  &[Scope::Read, Scope::Write, Scope::ForcedWrite, Scope::ForcedDelete];
pub const CREATE: &[Scope] = &[Scope::Write];
pub const UPDATE: &[Scope] = &[Scope::Write, Scope::ForcedWrite];
pub const DELETE: &[Scope] = &[Scope::Write, Scope::ForcedDelete];

/// The scopes a request carries. A missing header means no scopes.
#[derive(Debug, Clone, Default)]
pub struct CallerScopes(pub Scopes);

impl CallerScopes {
  /// Fail with 403 unless one of `required` is held.
  pub fn require(&self, required: &[Scope]) -> Result<(), ApiError> {
    Ok(self.0.require_any(required)?)
  }

  pub fn into_inner(self) -> Scopes { self.0 }
}

impl<S: Send + Sync> FromRequestParts<S> for CallerScopes {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let scopes = parts
      .headers
      .get_all(SCOPES_HEADER)
      .iter()
      .filter_map(|v| v.to_str().ok())
      .flat_map(|raw| Scopes::parse(raw).iter().collect::<Vec<_>>())
      .collect();
    Ok(CallerScopes(scopes))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::Request;

  use super::*;

  async fn extract(values: &[&str]) -> CallerScopes {
    let mut builder = Request::builder().uri("/");
    for v in values {
      builder = builder.header(SCOPES_HEADER, *v);
    }
    let (mut parts, ()) = builder.body(()).unwrap().into_parts();
    CallerScopes::from_request_parts(&mut parts, &()).await.unwrap()
  }

  #[tokio::test]
  async fn missing_header_grants_nothing() {
    let scopes = extract(&[]).await;
    assert!(scopes.require(READ).is_err());
  }

  #[tokio::test]
  async fn repeated_headers_accumulate() {
    let scopes = extract(&["catalogi.lezen", "catalogi.geforceerd-schrijven"]).await;
    assert!(scopes.0.contains(Scope::Read));
    assert!(scopes.0.forced_write());
    assert!(scopes.require(CREATE).is_err());
    assert!(scopes.require(UPDATE).is_ok());
  }
}
