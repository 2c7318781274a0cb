//! Control endpoints that forward commands to a session's actor.
//!
//! Each endpoint resolves the session's current actor handle, issues one
//! command, and returns the snapshot the actor replied with. Numeric
//! arguments are clamped by the actor, never rejected here.
//!
//! # Endpoints
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `POST` | `/api/sessions/{id}/start` | -- |
//! | `POST` | `/api/sessions/{id}/stop` | -- |
//! | `POST` | `/api/sessions/{id}/step` | -- |
//! | `POST` | `/api/sessions/{id}/randomize` | -- |
//! | `POST` | `/api/sessions/{id}/clear` | -- |
//! | `POST` | `/api/sessions/{id}/toggle` | `{row, col}` |
//! | `POST` | `/api/sessions/{id}/speed` | `{tick_ms}` |
//! | `POST` | `/api/sessions/{id}/resize` | `{rows, cols}` |
//! | `POST` | `/api/sessions/{id}/pattern` | `{key}` |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use lifegrid_core::command::Command;
use lifegrid_types::Snapshot;

use crate::error::ObserverError;
use crate::handlers::parse_session_id;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/sessions/{id}/toggle`.
#[derive(Debug, serde::Deserialize)]
pub struct ToggleRequest {
    /// Row of the cell.
    pub row: u32,
    /// Column of the cell.
    pub col: u32,
}

/// Request body for `POST /api/sessions/{id}/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SpeedRequest {
    /// Tick delay in milliseconds (clamped to 50..=2000).
    pub tick_ms: i64,
}

/// Request body for `POST /api/sessions/{id}/resize`.
#[derive(Debug, serde::Deserialize)]
pub struct ResizeRequest {
    /// Number of rows (clamped to 5..=100).
    pub rows: i64,
    /// Number of columns (clamped to 5..=100).
    pub cols: i64,
}

/// Request body for `POST /api/sessions/{id}/pattern`.
#[derive(Debug, serde::Deserialize)]
pub struct PatternRequest {
    /// Catalog key, e.g. `glider`.
    pub key: String,
}

// ---------------------------------------------------------------------------
// Bodiless commands
// ---------------------------------------------------------------------------

/// Begin advancing on the timer.
pub async fn start(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<Json<Snapshot>, ObserverError> {
    forward(&state, &id_str, Command::Start).await
}

/// Stop advancing.
pub async fn stop(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<Json<Snapshot>, ObserverError> {
    forward(&state, &id_str, Command::Stop).await
}

/// Evolve one generation. Ignored while running.
pub async fn step(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<Json<Snapshot>, ObserverError> {
    forward(&state, &id_str, Command::Step).await
}

/// Reseed the grid randomly.
pub async fn randomize(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<Json<Snapshot>, ObserverError> {
    forward(&state, &id_str, Command::Randomize).await
}

/// Kill every cell.
pub async fn clear(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<Json<Snapshot>, ObserverError> {
    forward(&state, &id_str, Command::Clear).await
}

// ---------------------------------------------------------------------------
// Commands with a body
// ---------------------------------------------------------------------------

/// Flip one cell. Cells outside the grid are a 400.
pub async fn toggle(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(body): Json<ToggleRequest>,
) -> Result<Json<Snapshot>, ObserverError> {
    let command = Command::ToggleCell {
        row: body.row,
        col: body.col,
    };
    forward(&state, &id_str, command).await
}

/// Change the tick delay.
pub async fn speed(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(body): Json<SpeedRequest>,
) -> Result<Json<Snapshot>, ObserverError> {
    let command = Command::SetSpeed {
        tick_ms: body.tick_ms,
    };
    forward(&state, &id_str, command).await
}

/// Resize and reseed the grid.
pub async fn resize(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(body): Json<ResizeRequest>,
) -> Result<Json<Snapshot>, ObserverError> {
    let command = Command::Resize {
        rows: body.rows,
        cols: body.cols,
    };
    forward(&state, &id_str, command).await
}

/// Replace the grid with a catalog pattern. Unknown keys are a 404.
pub async fn pattern(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(body): Json<PatternRequest>,
) -> Result<Json<Snapshot>, ObserverError> {
    forward(&state, &id_str, Command::LoadPattern { key: body.key }).await
}

/// Resolve the session and send one command to its actor.
async fn forward(
    state: &AppState,
    id_str: &str,
    command: Command,
) -> Result<Json<Snapshot>, ObserverError> {
    let session = parse_session_id(id_str)?;
    let handle = state.handle(session).await?;
    tracing::debug!(session = %session, command = command.name(), "forwarding command");
    let snapshot = handle.request(command).await?;
    Ok(Json(snapshot))
}
