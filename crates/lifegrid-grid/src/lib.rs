//! Toroidal grid engine and pattern catalog for the Lifegrid simulation.
//!
//! Everything in this crate is pure: functions take a grid and its
//! dimensions and return a new value. Side effects (timers, publishing,
//! randomness sources) belong to the caller.
//!
//! # Modules
//!
//! - [`error`] -- Error types for catalog lookups.
//! - [`grid`] -- The [`Grid`] alive-cell set: evolution, toggling,
//!   random seeding, counting.
//! - [`patterns`] -- The fixed pattern catalog and centered placement.
//! - [`render`] -- Plain-text rendering of a grid.

pub mod error;
pub mod grid;
pub mod patterns;
pub mod render;

// Re-export primary types at crate root.
pub use error::GridError;
pub use grid::{Grid, RANDOM_DENSITY};
pub use patterns::{CATALOG, Pattern, place_pattern};
pub use render::render_text;
