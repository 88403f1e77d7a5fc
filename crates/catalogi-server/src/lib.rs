//! HTTP server wiring for the Catalogi API.
//!
//! Opens the SQLite store, builds the selectielijst client and mounts
//! [`catalogi_api::api_router`] under `/api/v1` with request tracing.

pub mod error;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use catalogi_selectielijst::{ClientConfig, SelectielijstClient};
use catalogi_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Path prefix the API is served under.
pub const API_PREFIX: &str = "/api/v1";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CATALOGI_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  /// SQLite database file; `:memory:` keeps everything in process.
  pub store_path:    PathBuf,
  pub selectielijst: ClientConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:          "127.0.0.1".into(),
      port:          8000,
      store_path:    PathBuf::from("catalogi.db"),
      selectielijst: ClientConfig::default(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Mount the API for an already-opened store and client.
pub fn router(store: Arc<SqliteStore>, selectielijst: Arc<SelectielijstClient>) -> Router {
  Router::new()
    .nest(API_PREFIX, catalogi_api::api_router(store, selectielijst))
    .layer(TraceLayer::new_for_http())
}

/// Open the store and client described by `config` and mount the API.
pub async fn app(config: &ServerConfig) -> Result<Router> {
  let store = if config.store_path.as_os_str() == ":memory:" {
    SqliteStore::open_in_memory().await?
  } else {
    SqliteStore::open(&config.store_path).await?
  };
  let selectielijst = SelectielijstClient::new(&config.selectielijst)?;
  tracing::info!(store = ?config.store_path, "opened catalog store");
  Ok(router(Arc::new(store), Arc::new(selectielijst)))
}
