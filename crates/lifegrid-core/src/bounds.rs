//! Clamping of user-supplied grid dimensions and tick speed.
//!
//! Out-of-range values are never rejected. Negative, zero, and huge
//! inputs are pulled to the nearest bound.

use lifegrid_types::Dimensions;

/// Smallest allowed number of rows or columns.
pub const MIN_DIMENSION: u32 = 5;

/// Largest allowed number of rows or columns.
pub const MAX_DIMENSION: u32 = 100;

/// Shortest allowed delay between ticks, in milliseconds.
pub const MIN_TICK_MS: u64 = 50;

/// Longest allowed delay between ticks, in milliseconds.
pub const MAX_TICK_MS: u64 = 2_000;

/// Clamp a row or column count into `[MIN_DIMENSION, MAX_DIMENSION]`.
pub fn clamp_dimension(value: i64) -> u32 {
    let clamped = value.clamp(i64::from(MIN_DIMENSION), i64::from(MAX_DIMENSION));
    u32::try_from(clamped).unwrap_or(MIN_DIMENSION)
}

/// Clamp both axes of a grid size.
pub fn clamp_dimensions(rows: i64, cols: i64) -> Dimensions {
    Dimensions::new(clamp_dimension(rows), clamp_dimension(cols))
}

/// Clamp a tick delay into `[MIN_TICK_MS, MAX_TICK_MS]`.
pub fn clamp_tick_ms(value: i64) -> u64 {
    let min = i64::try_from(MIN_TICK_MS).unwrap_or(i64::MAX);
    let max = i64::try_from(MAX_TICK_MS).unwrap_or(i64::MAX);
    u64::try_from(value.clamp(min, max)).unwrap_or(MIN_TICK_MS)
}
