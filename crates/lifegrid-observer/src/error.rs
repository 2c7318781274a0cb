//! Error types for the Observer API server.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lifegrid_core::actor::ActorError;
use lifegrid_core::supervisor::SupervisorError;

/// Errors that can occur in the Observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested session or pattern was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was well-formed but cannot be applied.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A UUID could not be parsed from the request path.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// The session's actor is gone or restarting.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The session's actor did not answer in time.
    #[error("timed out: {0}")]
    Timeout(String),
}

impl From<ActorError> for ObserverError {
    fn from(err: ActorError) -> Self {
        match err {
            ActorError::Unavailable => Self::Unavailable(err.to_string()),
            ActorError::Timeout { .. } => Self::Timeout(err.to_string()),
            ActorError::PatternNotFound { .. } => Self::NotFound(err.to_string()),
            ActorError::CellOutOfBounds { .. } => Self::InvalidRequest(err.to_string()),
        }
    }
}

impl From<SupervisorError> for ObserverError {
    fn from(err: SupervisorError) -> Self {
        match err {
            SupervisorError::SessionNotFound { session } => {
                Self::NotFound(format!("session {session}"))
            }
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidRequest(msg) | Self::InvalidUuid(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::Unavailable(msg) | Self::Timeout(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
