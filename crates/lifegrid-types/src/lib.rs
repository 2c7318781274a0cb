//! Shared type definitions for the Lifegrid simulation.
//!
//! This crate is the single source of truth for the data model shared by
//! the grid engine, the actor runtime, and the observer server. Types that
//! cross the wire are exported to `TypeScript` via `ts-rs` for the web
//! client that draws the grid.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for session identifiers
//! - [`enums`] -- Pattern categories
//! - [`structs`] -- Cells, grid dimensions, and state snapshots

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::PatternCategory;
pub use ids::SessionId;
pub use structs::{Cell, Dimensions, Snapshot};
