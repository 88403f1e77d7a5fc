//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Bodies follow the problem-details shape clients of the Catalogi API
//! expect: `{ "code", "title", "status", "invalidParams" }`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use catalogi_core::{
  PermissionError, ValidationError, error::NON_FIELD_ERRORS, store::StoreError,
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("invalid input: {0}")]
  Validation(ValidationError),

  #[error("permission denied: {0}")]
  Permission(PermissionError),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Surface the business-rule failure a store error wraps, if any.
  pub fn from_store<E: StoreError>(err: E) -> Self {
    match err.as_core() {
      Some(core) if !matches!(core, catalogi_core::Error::Storage(_)) => {
        Self::from_core(core)
      }
      _ => Self::Store(Box::new(err)),
    }
  }

  fn from_core(err: &catalogi_core::Error) -> Self {
    match err {
      catalogi_core::Error::Validation(v) => Self::Validation(v.clone()),
      catalogi_core::Error::Permission(p) => Self::Permission(p.clone()),
      catalogi_core::Error::NotFound { entity, id } => {
        Self::NotFound(format!("{entity} {id} not found"))
      }
      other => Self::BadRequest(other.to_string()),
    }
  }
}

impl From<ValidationError> for ApiError {
  fn from(err: ValidationError) -> Self { Self::Validation(err) }
}

impl From<PermissionError> for ApiError {
  fn from(err: PermissionError) -> Self { Self::Permission(err) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = match &self {
      ApiError::Validation(v) => json!({
        "code":   "invalid",
        "title":  "Invalid input.",
        "status": 400,
        "invalidParams": [{
          "name":   v.field_path,
          "code":   v.code,
          "reason": v.message,
        }],
      }),
      ApiError::Permission(p) => json!({
        "code":   "permission_denied",
        "title":  p.to_string(),
        "status": 403,
      }),
      ApiError::NotFound(m) => json!({
        "code":   "not_found",
        "title":  m,
        "status": 404,
      }),
      ApiError::BadRequest(m) => json!({
        "code":   "parse_error",
        "title":  m,
        "status": 400,
        "invalidParams": [{
          "name":   NON_FIELD_ERRORS,
          "code":   "invalid",
          "reason": m,
        }],
      }),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        json!({
          "code":   "error",
          "title":  "A server error occurred.",
          "status": 500,
        })
      }
    };
    (self.status(), Json(body)).into_response()
  }
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Permission(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

#[cfg(test)]
mod tests {
  use catalogi_core::{ErrorCode, Scope};
  use uuid::Uuid;

  use super::*;

  #[derive(Debug, Error)]
  #[error("wrapped: {0}")]
  struct Wrapped(catalogi_core::Error);

  impl StoreError for Wrapped {
    fn as_core(&self) -> Option<&catalogi_core::Error> { Some(&self.0) }
  }

  #[test]
  fn store_errors_map_onto_status_codes() {
    let validation = Wrapped(
      ValidationError::new("begin_validity", ErrorCode::Overlap, "overlap").into(),
    );
    assert_eq!(ApiError::from_store(validation).status(), StatusCode::BAD_REQUEST);

    let permission =
      Wrapped(PermissionError::MissingScope(vec![Scope::Write]).into());
    assert_eq!(ApiError::from_store(permission).status(), StatusCode::FORBIDDEN);

    let missing = Wrapped(catalogi_core::Error::NotFound {
      entity: "versioned type",
      id:     Uuid::nil(),
    });
    assert_eq!(ApiError::from_store(missing).status(), StatusCode::NOT_FOUND);

    let io = Wrapped(catalogi_core::Error::storage(std::io::Error::other("disk")));
    assert_eq!(
      ApiError::from_store(io).status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[tokio::test]
  async fn validation_body_lists_the_invalid_param() {
    let err = ApiError::from(ValidationError::new(
      "archival_procedure.registration",
      ErrorCode::Required,
      "required for ander_datumkenmerk",
    ));
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["invalidParams"][0]["name"], "archival_procedure.registration");
    assert_eq!(body["invalidParams"][0]["code"], "required");
  }
}
