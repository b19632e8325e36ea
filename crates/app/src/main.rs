//! Parley - terminal chat client
//!
//! Keeps a local message log in sync with a REST message API by polling,
//! and sends messages that appear once the server has echoed them.

use std::path::PathBuf;
use std::sync::Arc;

use parley_core::ClientConfig;
use parley_net::HttpClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod engine;
mod state;
mod sync;
mod terminal;
mod viewmodel;

fn main() {
    // Logs go to stderr so they never interleave with the chat screen
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    tracing::info!("Starting Parley");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match ClientConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let client = match HttpClient::from_config(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to create HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = match state::AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(terminal::run(app_state, client)) {
        tracing::error!("Terminal error: {}", e);
        std::process::exit(1);
    }
}
