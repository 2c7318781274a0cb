//! Observer server startup helper for embedding in the server binary.
//!
//! Provides [`spawn_observer`] which binds the listener eagerly and then
//! serves the Observer HTTP + `WebSocket` API on a background Tokio task,
//! so the binary can run the supervisor and the server side by side.

use std::future::Future;
use std::sync::Arc;

use lifegrid_core::config::ServerConfig;
use tokio::task::JoinHandle;

use crate::server::{ServerError, bind, start_server};
use crate::state::AppState;

/// Why the Observer could not be brought up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The listener could not be created.
    #[error("observer listener: {source}")]
    Listener {
        /// The bind failure.
        #[from]
        source: ServerError,
    },
}

/// Spawn the Observer HTTP server on a background Tokio task.
///
/// The listener is bound before this returns, so an unusable address is
/// reported here rather than from inside the task. The server drains and
/// exits once `shutdown` resolves; await the returned handle to wait for
/// that.
///
/// # Errors
///
/// Returns [`StartupError::Listener`] if the address is invalid or taken.
pub async fn spawn_observer<F>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<JoinHandle<()>, StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = bind(config).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = start_server(listener, state, shutdown).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(host = %config.host, port = config.port, "Observer server spawned on background task");

    Ok(handle)
}
