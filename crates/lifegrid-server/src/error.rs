//! Error types for the server binary.
//!
//! [`LaunchError`] is the top-level error type that wraps all possible
//! failure modes during startup and shutdown.

/// Top-level error for the server binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: lifegrid_core::config::ConfigError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: lifegrid_observer::StartupError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The observer task panicked or was cancelled.
    #[error("observer task failed: {source}")]
    ObserverTask {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}
