//! Observer API server for the Lifegrid simulation.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for creating, inspecting, and ending sessions and
//!   for listing the pattern catalog
//! - **Control endpoints** that forward commands (start, stop, step,
//!   toggle, resize, ...) to a session's actor
//! - **`WebSocket` endpoint** (`/ws/sessions/{id}`) streaming every
//!   published snapshot of one session
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! The observer never touches a grid. Every request resolves the
//! session's current [`ActorHandle`] through the [`SessionSupervisor`]
//! and talks to the actor through it. `WebSocket` clients subscribe to
//! the session's topic on the snapshot bus and follow the supervisor's
//! watch channel across actor restarts.
//!
//! [`ActorHandle`]: lifegrid_core::actor::ActorHandle
//! [`SessionSupervisor`]: lifegrid_core::supervisor::SessionSupervisor

pub mod control;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use startup::{StartupError, spawn_observer};
pub use state::AppState;
