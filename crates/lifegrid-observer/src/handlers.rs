//! REST API endpoint handlers for sessions and the pattern catalog.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/patterns` | Pattern catalog grouped by category |
//! | `GET` | `/api/sessions` | List live sessions |
//! | `POST` | `/api/sessions` | Start a session |
//! | `GET` | `/api/sessions/{id}` | Current snapshot |
//! | `DELETE` | `/api/sessions/{id}` | End a session |
//! | `GET` | `/api/sessions/{id}/render` | Plain-text grid render |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use lifegrid_grid::patterns::by_category;
use lifegrid_grid::{Grid, render_text};
use lifegrid_types::{PatternCategory, SessionId};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/sessions`. Omitted fields use the
/// configured defaults; out-of-range values are clamped.
#[derive(Debug, Default, serde::Deserialize)]
pub struct CreateSessionRequest {
    /// Number of rows.
    pub rows: Option<i64>,
    /// Number of columns.
    pub cols: Option<i64>,
    /// Tick delay in milliseconds.
    pub tick_ms: Option<i64>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing live sessions and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let sessions = state.supervisor.sessions().await;
    let session_count = sessions.len();
    let rows: String = sessions
        .iter()
        .map(|s| {
            format!(
                "        <li><a href=\"/api/sessions/{id}/render\">{id}</a> -- {r}x{c} @ {t} ms, {n} restarts</li>\n",
                id = s.id,
                r = s.settings.rows,
                c = s.settings.cols,
                t = s.settings.tick_ms,
                n = s.restarts,
            )
        })
        .collect();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Lifegrid Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #3fb950; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Lifegrid Observer</h1>
    <p class="subtitle">Toroidal cellular automaton server</p>

    <p>Status: <span class="status">RUNNING</span> -- {session_count} live sessions</p>

    <h2>Sessions</h2>
    <ul>
{rows}    </ul>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/patterns">GET /api/patterns</a> -- Pattern catalog</li>
        <li><a href="/api/sessions">GET /api/sessions</a> -- List sessions</li>
        <li>POST /api/sessions -- Start a session</li>
        <li>GET /api/sessions/{{id}} -- Current snapshot</li>
        <li>POST /api/sessions/{{id}}/start | stop | step | randomize | clear</li>
        <li>POST /api/sessions/{{id}}/toggle | speed | resize | pattern</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li><code>ws://host:port/ws/sessions/{{id}}</code> -- Live snapshot stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/patterns -- catalog grouped by category
// ---------------------------------------------------------------------------

/// List every catalog pattern, grouped by category in display order.
pub async fn list_patterns() -> impl IntoResponse {
    let categories: Vec<serde_json::Value> = PatternCategory::ALL
        .iter()
        .map(|&category| {
            let patterns: Vec<serde_json::Value> = by_category(category)
                .map(|pattern| {
                    let (max_row, max_col) = pattern.extent();
                    serde_json::json!({
                        "key": pattern.key,
                        "name": pattern.name,
                        "cell_count": pattern.cell_count(),
                        "height": max_row.saturating_add(1),
                        "width": max_col.saturating_add(1),
                        "cells": pattern.cells,
                    })
                })
                .collect();
            serde_json::json!({
                "category": category,
                "patterns": patterns,
            })
        })
        .collect();

    Json(serde_json::json!({ "categories": categories }))
}

// ---------------------------------------------------------------------------
// /api/sessions
// ---------------------------------------------------------------------------

/// List live sessions with their settings and subscriber counts.
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let sessions: Vec<serde_json::Value> = state
        .supervisor
        .sessions()
        .await
        .into_iter()
        .map(|summary| {
            let subscribers = state.bus().subscriber_count(summary.id);
            serde_json::json!({
                "id": summary.id,
                "created_at": summary.created_at,
                "restarts": summary.restarts,
                "settings": summary.settings,
                "subscribers": subscribers,
            })
        })
        .collect();

    Json(serde_json::json!({
        "count": sessions.len(),
        "sessions": sessions,
    }))
}

/// Start a new session and return its id and first snapshot.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let defaults = state.supervisor.default_settings();
    let (session, handle) = state
        .supervisor
        .start_session(
            request.rows.unwrap_or_else(|| i64::from(defaults.rows)),
            request.cols.unwrap_or_else(|| i64::from(defaults.cols)),
            request
                .tick_ms
                .unwrap_or_else(|| i64::try_from(defaults.tick_ms).unwrap_or(i64::MAX)),
        )
        .await;
    let snapshot = handle.get_state().await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": session,
            "snapshot": snapshot,
        })),
    ))
}

/// Return the current snapshot of a session.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let session = parse_session_id(&id_str)?;
    let snapshot = state.handle(session).await?.get_state().await?;
    Ok(Json(snapshot))
}

/// End a session. Its actor is shut down and not restarted.
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let session = parse_session_id(&id_str)?;
    state.supervisor.end_session(session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Render a session's grid as text: `#` alive, `.` dead, one line per row.
pub async fn render_session(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let session = parse_session_id(&id_str)?;
    let snapshot = state.handle(session).await?.get_state().await?;
    let grid = Grid::from_cells(snapshot.alive_cells.iter().copied());
    Ok(render_text(&grid, snapshot.dimensions()))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a session id from a path segment, returning an
/// [`ObserverError`] on failure.
pub(crate) fn parse_session_id(s: &str) -> Result<SessionId, ObserverError> {
    s.parse::<SessionId>()
        .map_err(|e| ObserverError::InvalidUuid(format!("{s}: {e}")))
}
