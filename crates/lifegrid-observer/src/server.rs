//! Observer HTTP server lifecycle management.
//!
//! Provides [`bind`] and [`start_server`]. The server runs until the
//! provided shutdown future resolves, then drains in-flight requests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use lifegrid_core::config::ServerConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Bind the listener described by `config.host` and `config.port`.
///
/// Port 0 asks the OS for an ephemeral port.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = format!("{}:{}", config.host, config.port);
    let socket = addr
        .parse::<SocketAddr>()
        .map_err(|e| ServerError::InvalidAddress {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;

    TcpListener::bind(socket)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serve the Observer API on an already-bound listener until `shutdown`
/// resolves.
///
/// Fails only on a fatal I/O error from the accept loop.
pub async fn start_server<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_router(state);

    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Observer server listening");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|source| ServerError::Serve { source })?;

    info!("Observer server stopped");
    Ok(())
}

/// Failures of the Observer listener.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// `host:port` is not a socket address.
    #[error("invalid listen address {addr}: {reason}")]
    InvalidAddress {
        /// The rejected `host:port` string.
        addr: String,
        /// Why it did not parse.
        reason: String,
    },

    /// The address parsed but could not be bound.
    #[error("cannot bind {addr}: {source}")]
    Bind {
        /// The address that was tried.
        addr: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("observer server failed: {source}")]
    Serve {
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
