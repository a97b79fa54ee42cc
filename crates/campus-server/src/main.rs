//! campus-server binary.
//!
//! Reads `campus.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the board API over HTTP.
//!
//! ```
//! cargo run -p campus-server -- --config campus.toml
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use campus_api::AppState;
use campus_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod settings;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Campus board API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "campus.toml")]
  config: PathBuf,

  /// Load and validate the configuration, print it, and exit.
  #[arg(long)]
  check_config: bool,
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
  let server_cfg = ServerConfig::load(&cli.config)?;

  if cli.check_config {
    println!("{server_cfg:#?}");
    return Ok(());
  }

  let store_path = server_cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = AppState::new(store, server_cfg.api_config());
  let app = campus_api::api_router(state);
  let address = server_cfg.address();

  tracing::info!(store = ?store_path, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
