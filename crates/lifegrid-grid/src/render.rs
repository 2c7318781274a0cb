//! Plain-text rendering of a grid.
//!
//! One line per row, `#` for alive and `.` for dead. Used for the
//! observer's text endpoint and for debugging in tests.

use lifegrid_types::{Cell, Dimensions};

use crate::grid::Grid;

/// Glyph for an alive cell.
pub const ALIVE: char = '#';

/// Glyph for a dead cell.
pub const DEAD: char = '.';

/// Render `grid` as `dims.rows` lines of `dims.cols` glyphs, joined by
/// `\n` with no trailing newline.
pub fn render_text(grid: &Grid, dims: Dimensions) -> String {
    let width = usize::try_from(dims.cols).unwrap_or(0);
    let height = usize::try_from(dims.rows).unwrap_or(0);
    let mut out = String::with_capacity(width.saturating_add(1).saturating_mul(height));

    for row in 0..dims.rows {
        if row > 0 {
            out.push('\n');
        }
        for col in 0..dims.cols {
            out.push(if grid.is_alive(Cell::new(row, col)) {
                ALIVE
            } else {
                DEAD
            });
        }
    }
    out
}
