//! The alive-cell set and the evolution rule.
//!
//! A [`Grid`] stores only the alive cells. Dimensions are passed alongside
//! it rather than stored, since the owner decides how the grid wraps.
//!
//! # Evolution
//!
//! [`Grid::evolve`] only visits cells adjacent to at least one alive
//! cell. A dead cell with no alive neighbor can never be born, so the cost
//! of one generation is proportional to the population, not the area.

use std::collections::{BTreeMap, BTreeSet};

use lifegrid_types::{Cell, Dimensions};
use rand::Rng;

/// Probability that any given cell starts alive in [`Grid::random`].
pub const RANDOM_DENSITY: f64 = 0.3;

/// Offsets of the eight Moore neighbors.
const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Set of alive cells on a toroidal grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Grid {
    cells: BTreeSet<Cell>,
}

impl Grid {
    /// A grid with no alive cells.
    pub const fn empty() -> Self {
        Self {
            cells: BTreeSet::new(),
        }
    }

    /// Build a grid from an arbitrary collection of cells. Duplicates
    /// collapse.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = Cell>,
    {
        Self {
            cells: cells.into_iter().collect(),
        }
    }

    /// A grid where every cell is independently alive with probability
    /// [`RANDOM_DENSITY`].
    pub fn random<R: Rng>(dims: Dimensions, rng: &mut R) -> Self {
        let mut cells = BTreeSet::new();
        for row in 0..dims.rows {
            for col in 0..dims.cols {
                if rng.random_bool(RANDOM_DENSITY) {
                    cells.insert(Cell::new(row, col));
                }
            }
        }
        Self { cells }
    }

    /// Compute the next generation on a torus of the given size.
    ///
    /// A candidate cell survives with two or three alive neighbors and is
    /// born with exactly three.
    #[must_use]
    pub fn evolve(&self, dims: Dimensions) -> Self {
        let mut counts: BTreeMap<Cell, u8> = BTreeMap::new();
        for &cell in &self.cells {
            for (dr, dc) in NEIGHBOR_OFFSETS {
                if let Some(neighbor) = wrap(cell, dr, dc, dims) {
                    let count = counts.entry(neighbor).or_insert(0);
                    *count = count.saturating_add(1);
                }
            }
        }

        let cells = counts
            .into_iter()
            .filter(|(cell, count)| {
                matches!((self.cells.contains(cell), *count), (true, 2 | 3) | (false, 3))
            })
            .map(|(cell, _)| cell)
            .collect();

        Self { cells }
    }

    /// Flip a single cell. Returns `true` if the cell is now alive.
    pub fn toggle_cell(&mut self, cell: Cell) -> bool {
        if self.cells.remove(&cell) {
            false
        } else {
            self.cells.insert(cell);
            true
        }
    }

    /// Copy of this grid with `cell` flipped.
    #[must_use]
    pub fn toggled(&self, cell: Cell) -> Self {
        let mut next = self.clone();
        next.toggle_cell(cell);
        next
    }

    /// Whether `cell` is alive.
    pub fn is_alive(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Number of alive cells.
    pub fn alive_count(&self) -> usize {
        self.cells.len()
    }

    /// Alive cells sorted by row, then column.
    pub fn alive_cells(&self) -> Vec<Cell> {
        self.cells.iter().copied().collect()
    }

    /// Iterate alive cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Whether the grid has no alive cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether every alive cell lies inside `dims`.
    pub fn fits_within(&self, dims: Dimensions) -> bool {
        self.cells.iter().all(|&cell| dims.contains(cell))
    }

    /// Copy of this grid shifted by `(dr, dc)` with wrap-around.
    #[must_use]
    pub fn translated(&self, dr: i64, dc: i64, dims: Dimensions) -> Self {
        Self {
            cells: self
                .cells
                .iter()
                .filter_map(|&cell| wrap(cell, dr, dc, dims))
                .collect(),
        }
    }
}

impl FromIterator<Cell> for Grid {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        Self::from_cells(iter)
    }
}

/// Move `cell` by `(dr, dc)` on a torus. Returns `None` only for a
/// zero-sized axis.
pub(crate) fn wrap(cell: Cell, dr: i64, dc: i64, dims: Dimensions) -> Option<Cell> {
    let row = wrap_axis(cell.row, dr, dims.rows)?;
    let col = wrap_axis(cell.col, dc, dims.cols)?;
    Some(Cell::new(row, col))
}

/// `(coord + delta) mod size` with the result in `[0, size)`.
pub(crate) fn wrap_axis(coord: u32, delta: i64, size: u32) -> Option<u32> {
    let wrapped = i64::from(coord)
        .wrapping_add(delta)
        .checked_rem_euclid(i64::from(size))?;
    u32::try_from(wrapped).ok()
}
