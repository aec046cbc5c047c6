//! `TaskBoard` persistence server — in-memory task API.
//!
//! An axum REST server holding the authoritative task records that the
//! board client reconciles against.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:9400 with the demo board
//! cargo run --bin taskboard-server -- --seed-demo
//!
//! # Run on custom address
//! cargo run --bin taskboard-server -- --bind 127.0.0.1:8080
//!
//! # Or via environment variable
//! TASKBOARD_ADDR=127.0.0.1:8080 cargo run --bin taskboard-server
//! ```

use std::sync::Arc;

use clap::Parser;
use taskboard_server::config::{ServerCliArgs, ServerConfig};
use taskboard_server::routes::{self, ServerState};

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting taskboard server");

    let state = Arc::new(ServerState::new());
    if config.seed_demo {
        state.table.seed_demo().await;
        tracing::info!("seeded demo board");
    }

    match routes::start_server(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "task API server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "task API server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start task API server");
            std::process::exit(1);
        }
    }
}
