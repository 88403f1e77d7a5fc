//! Strong ETags for single-resource responses.
//!
//! The tag is the SHA-256 of the serialised JSON body, so any visible change
//! to a resource changes its tag.

use axum::{
  http::{HeaderMap, HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::ApiError;

pub fn compute_etag(body: &[u8]) -> String {
  format!("\"{}\"", hex::encode(Sha256::digest(body)))
}

fn matches(headers: &HeaderMap, etag: &str) -> bool {
  headers
    .get_all(header::IF_NONE_MATCH)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .map(str::trim)
    .any(|candidate| candidate == etag || candidate == "*")
}

/// `200` with an `ETag`, or `304` when the client already holds this version.
pub fn conditional<T: Serialize>(
  headers: &HeaderMap,
  value: &T,
) -> Result<Response, ApiError> {
  let body = serde_json::to_vec(value)
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let etag = compute_etag(&body);
  let etag_header = HeaderValue::from_str(&etag)
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  if matches(headers, &etag) {
    return Ok(
      (StatusCode::NOT_MODIFIED, [(header::ETAG, etag_header)]).into_response(),
    );
  }
  let headers = [
    (header::ETAG, etag_header),
    (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
  ];
  Ok((headers, body).into_response())
}
