//! Startup errors for the server.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to open store: {0}")]
  Store(#[from] catalogi_store_sqlite::Error),

  #[error("failed to build selectielijst client: {0}")]
  Selectielijst(#[from] catalogi_selectielijst::ClientError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
