//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin web client access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{control, handlers, ws};

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /api/patterns` -- pattern catalog
/// - `GET|POST /api/sessions` -- list / start sessions
/// - `GET|DELETE /api/sessions/{id}` -- snapshot / end session
/// - `GET /api/sessions/{id}/render` -- plain-text render
/// - `POST /api/sessions/{id}/{command}` -- control endpoints
/// - `GET /ws/sessions/{id}` -- `WebSocket` snapshot stream
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/sessions/{id}", get(ws::ws_session))
        // REST API
        .route("/api/patterns", get(handlers::list_patterns))
        .route(
            "/api/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/api/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/sessions/{id}/render", get(handlers::render_session))
        // Control API
        .route("/api/sessions/{id}/start", post(control::start))
        .route("/api/sessions/{id}/stop", post(control::stop))
        .route("/api/sessions/{id}/step", post(control::step))
        .route("/api/sessions/{id}/randomize", post(control::randomize))
        .route("/api/sessions/{id}/clear", post(control::clear))
        .route("/api/sessions/{id}/toggle", post(control::toggle))
        .route("/api/sessions/{id}/speed", post(control::speed))
        .route("/api/sessions/{id}/resize", post(control::resize))
        .route("/api/sessions/{id}/pattern", post(control::pattern))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
