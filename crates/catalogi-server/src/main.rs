//! catalogi-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), layers
//! `CATALOGI_*` environment variables on top, opens the SQLite store and
//! serves the Catalogi API over HTTP.
//!
//! Nested keys use a double underscore, e.g.
//! `CATALOGI_SELECTIELIJST__TIMEOUT_SECS=5`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use catalogi_server::{API_PREFIX, ServerConfig};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Catalogi API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("CATALOGI")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.store_path = expand_tilde(&server_cfg.store_path);

  let app = catalogi_server::app(&server_cfg)
    .await
    .with_context(|| format!("failed to start with store {:?}", server_cfg.store_path))?;

  let address = server_cfg.address();
  tracing::info!("Listening on http://{address}{API_PREFIX}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
