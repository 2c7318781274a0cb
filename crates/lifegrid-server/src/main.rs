//! Server binary for the Lifegrid simulation.
//!
//! Wires configuration, logging, the session supervisor, and the
//! Observer API together, then runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `lifegrid-config.yaml` (or `LIFEGRID_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the snapshot bus and session supervisor
//! 4. Start the Observer API server
//! 5. Wait for `Ctrl-C`, end every session, and drain the server

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lifegrid_core::bus::SnapshotBus;
use lifegrid_core::config::LifegridConfig;
use lifegrid_core::supervisor::SessionSupervisor;
use lifegrid_observer::state::AppState;
use tokio::sync::oneshot;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::LaunchError;

/// Config file read when `LIFEGRID_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "lifegrid-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the observer cannot
/// bind, or the shutdown signal cannot be installed.
#[tokio::main]
async fn main() -> Result<(), LaunchError> {
    // 1. Load configuration.
    let path = config_path(std::env::var("LIFEGRID_CONFIG").ok());
    let (config, from_file) = load_config(&path)?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_err| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("lifegrid-server starting");
    if from_file {
        info!(path = %path.display(), "Configuration loaded");
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
    }
    info!(
        rows = config.simulation.rows,
        cols = config.simulation.cols,
        tick_ms = config.simulation.tick_ms,
        seed = ?config.simulation.seed,
        max_restarts = config.supervisor.max_restarts,
        "Simulation defaults"
    );

    // 3. Create the snapshot bus and supervisor.
    let bus = SnapshotBus::new(config.bus.capacity);
    let supervisor = SessionSupervisor::new(&config, bus);
    let state = Arc::new(AppState::new(supervisor.clone()));

    // 4. Start the Observer API server.
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let observer = lifegrid_observer::spawn_observer(&config.server, state, async move {
        let _ = stop_rx.await;
    })
    .await?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Observer API server started"
    );

    // 5. Run until interrupted.
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    supervisor.shutdown_all().await;
    info!(
        open_topics = supervisor.bus().topic_count(),
        "All sessions ended"
    );
    let _ = stop_tx.send(());
    observer.await?;

    info!("lifegrid-server stopped");
    Ok(())
}

/// Resolve the config file path from the `LIFEGRID_CONFIG` value.
fn config_path(env_value: Option<String>) -> PathBuf {
    env_value
        .filter(|value| !value.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist. Returns whether the file was read.
fn load_config(path: &Path) -> Result<(LifegridConfig, bool), LaunchError> {
    if path.exists() {
        Ok((LifegridConfig::from_file(path)?, true))
    } else {
        Ok((LifegridConfig::parse("")?, false))
    }
}
