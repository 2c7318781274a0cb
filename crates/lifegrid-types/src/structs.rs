//! Core data structs for the Lifegrid simulation.
//!
//! Covers the grid coordinate [`Cell`], the grid [`Dimensions`], and the
//! immutable [`Snapshot`] published to observers after every mutation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A single grid coordinate.
///
/// Cells order by row first, then column, so any ordered collection of
/// cells iterates in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Cell {
    /// Zero-based row index.
    pub row: u32,
    /// Zero-based column index.
    pub col: u32,
}

impl Cell {
    /// Create a cell at `(row, col)`.
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl From<(u32, u32)> for Cell {
    fn from((row, col): (u32, u32)) -> Self {
        Self { row, col }
    }
}

impl core::fmt::Display for Cell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Size of a toroidal grid.
///
/// Both axes are expected to be non-zero; the actor runtime clamps them
/// into `5..=100` before a grid is ever built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Dimensions {
    /// Number of rows.
    pub rows: u32,
    /// Number of columns.
    pub cols: u32,
}

impl Dimensions {
    /// Create dimensions of `rows` by `cols`.
    pub const fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Whether `cell` lies inside `[0, rows) x [0, cols)`.
    pub const fn contains(self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }
}

/// Immutable copy of one simulation's state, distributed to observers.
///
/// Snapshots are produced by the simulation actor after every state
/// change and in reply to `GetState`. `alive_cells` is sorted by row then
/// column and `alive_count` always equals its length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// Number of rows on the grid.
    pub rows: u32,
    /// Number of columns on the grid.
    pub cols: u32,
    /// Generations evolved since the last reset.
    pub generation: u64,
    /// Delay between ticks while running, in milliseconds.
    pub tick_ms: u64,
    /// Whether the simulation is advancing on its own.
    pub running: bool,
    /// Alive cells, sorted by row then column.
    pub alive_cells: Vec<Cell>,
    /// Number of alive cells.
    pub alive_count: usize,
}

impl Snapshot {
    /// Grid dimensions this snapshot describes.
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.rows, self.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_order_by_row_then_col() {
        let mut cells = vec![Cell::new(2, 0), Cell::new(0, 5), Cell::new(0, 1)];
        cells.sort();
        assert_eq!(cells, vec![Cell::new(0, 1), Cell::new(0, 5), Cell::new(2, 0)]);
    }

    #[test]
    fn dimensions_contains_checks_both_axes() {
        let dims = Dimensions::new(5, 8);
        assert!(dims.contains(Cell::new(4, 7)));
        assert!(!dims.contains(Cell::new(5, 0)));
        assert!(!dims.contains(Cell::new(0, 8)));
    }

    #[test]
    fn snapshot_json_shape() {
        let snapshot = Snapshot {
            rows: 5,
            cols: 6,
            generation: 3,
            tick_ms: 100,
            running: false,
            alive_cells: vec![Cell::new(1, 2)],
            alive_count: 1,
        };
        let value = serde_json::to_value(&snapshot).unwrap_or_default();
        assert_eq!(value["rows"], 5);
        assert_eq!(value["alive_cells"][0]["row"], 1);
        assert_eq!(value["alive_cells"][0]["col"], 2);
        assert_eq!(value["alive_count"], 1);
        assert_eq!(snapshot.dimensions(), Dimensions::new(5, 6));
    }
}
