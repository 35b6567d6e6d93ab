//! Hanzi Island · picture-to-symbol game backend
//!
//! - Axum HTTP API for the Chinese-character and English-letter games
//! - SQLite leaderboard and image-feedback counters (sqlx)
//! - Static front-end fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT              : u16 (default 8080, or `port` in the config file)
//!   DATABASE_URL      : SQLite URL (default "sqlite://game.db?mode=rwc")
//!   GAME_CONFIG_PATH  : path to TOML config (dataset paths, limits, messages)
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod dataset;
mod seeds;
mod error;
mod state;
mod protocol;
mod logic;
mod store;
mod routes;
mod pinyin;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::GameConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = GameConfig::load();

  // The datasets are read once here and shared read-only afterwards.
  let characters = dataset::load_characters(&config.characters_path)?;
  let letters = dataset::load_letters_or_builtin(&config.letters_path)?;
  let pool = store::connect(&config.database_url).await?;

  let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
  let state = Arc::new(AppState::new(config, characters, letters, pool));
  let app = build_router(state.clone());

  let listener = TcpListener::bind(addr).await?;
  info!(target: "hanzi_island", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  state.pool.close().await;
  info!(target: "hanzi_island", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "hanzi_island", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  info!(target: "hanzi_island", "Shutdown signal received");
}
