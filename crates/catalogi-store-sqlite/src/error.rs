//! Error type for `catalogi-store-sqlite`.

use catalogi_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] catalogi_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored value could not be decoded back into its domain type.
  #[error("decode error: {0}")]
  Decode(String),
}

impl StoreError for Error {
  fn as_core(&self) -> Option<&catalogi_core::Error> {
    match self {
      Self::Core(err) => Some(err),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
