//! The fixed pattern catalog and centered placement.
//!
//! Every entry lists its cells as `(row, col)` offsets relative to the top
//! left corner of its bounding box. The lists are golden data: tests pin
//! their sizes and periods, and clients may reproduce them verbatim.

use lifegrid_types::{Cell, Dimensions, PatternCategory};
use serde::Serialize;

use crate::error::GridError;
use crate::grid::{Grid, wrap_axis};

/// A named, immutable arrangement of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pattern {
    /// Lookup key used by `LoadPattern`.
    pub key: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Family the pattern belongs to.
    pub category: PatternCategory,
    /// Relative `(row, col)` offsets of the alive cells.
    pub cells: &'static [(u32, u32)],
}

impl Pattern {
    /// Largest relative row and column used by the pattern.
    pub fn extent(&self) -> (u32, u32) {
        self.cells
            .iter()
            .fold((0, 0), |(max_row, max_col), &(row, col)| {
                (max_row.max(row), max_col.max(col))
            })
    }

    /// Number of alive cells in the pattern.
    pub const fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Place the pattern centered on a grid of the given size.
    ///
    /// The offset per axis is `floor((dimension - extent - 1) / 2)`, which
    /// goes negative when the pattern is larger than the grid; cells then
    /// wrap. The result holds only this pattern's cells.
    pub fn place(&self, dims: Dimensions) -> Grid {
        let (max_row, max_col) = self.extent();
        let row_offset = centering_offset(dims.rows, max_row);
        let col_offset = centering_offset(dims.cols, max_col);

        self.cells
            .iter()
            .filter_map(|&(row, col)| {
                let row = wrap_axis(row, row_offset, dims.rows)?;
                let col = wrap_axis(col, col_offset, dims.cols)?;
                Some(Cell::new(row, col))
            })
            .collect()
    }
}

/// `floor((dimension - extent - 1) / 2)`.
fn centering_offset(dimension: u32, extent: u32) -> i64 {
    i64::from(dimension)
        .wrapping_sub(i64::from(extent))
        .wrapping_sub(1)
        .div_euclid(2)
}

/// Look up a pattern by key.
pub fn find(key: &str) -> Option<&'static Pattern> {
    CATALOG.iter().find(|pattern| pattern.key == key)
}

/// Patterns in `category`, in catalog order.
pub fn by_category(category: PatternCategory) -> impl Iterator<Item = &'static Pattern> {
    CATALOG
        .iter()
        .filter(move |pattern| pattern.category == category)
}

/// Build a grid holding only the pattern registered under `key`, centered
/// on a grid of the given size.
///
/// # Errors
///
/// Returns [`GridError::PatternNotFound`] if no pattern has that key.
pub fn place_pattern(key: &str, dims: Dimensions) -> Result<Grid, GridError> {
    find(key)
        .map(|pattern| pattern.place(dims))
        .ok_or_else(|| GridError::PatternNotFound {
            key: key.to_owned(),
        })
}

/// Every pattern a session can load.
pub const CATALOG: &[Pattern] = &[
    // --- Still lifes ---
    Pattern {
        key: "block",
        name: "Block",
        category: PatternCategory::StillLife,
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1)],
    },
    Pattern {
        key: "beehive",
        name: "Beehive",
        category: PatternCategory::StillLife,
        cells: &[(0, 1), (0, 2), (1, 0), (1, 3), (2, 1), (2, 2)],
    },
    Pattern {
        key: "loaf",
        name: "Loaf",
        category: PatternCategory::StillLife,
        cells: &[(0, 1), (0, 2), (1, 0), (1, 3), (2, 1), (2, 3), (3, 2)],
    },
    Pattern {
        key: "boat",
        name: "Boat",
        category: PatternCategory::StillLife,
        cells: &[(0, 0), (0, 1), (1, 0), (1, 2), (2, 1)],
    },
    // --- Oscillators ---
    Pattern {
        key: "blinker",
        name: "Blinker",
        category: PatternCategory::Oscillator,
        cells: &[(0, 0), (0, 1), (0, 2)],
    },
    Pattern {
        key: "toad",
        name: "Toad",
        category: PatternCategory::Oscillator,
        cells: &[(0, 1), (0, 2), (0, 3), (1, 0), (1, 1), (1, 2)],
    },
    Pattern {
        key: "beacon",
        name: "Beacon",
        category: PatternCategory::Oscillator,
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)],
    },
    Pattern {
        key: "pulsar",
        name: "Pulsar",
        category: PatternCategory::Oscillator,
        cells: &[
            (0, 2), (0, 3), (0, 4), (0, 8), (0, 9), (0, 10),
            (2, 0), (2, 5), (2, 7), (2, 12),
            (3, 0), (3, 5), (3, 7), (3, 12),
            (4, 0), (4, 5), (4, 7), (4, 12),
            (5, 2), (5, 3), (5, 4), (5, 8), (5, 9), (5, 10),
            (7, 2), (7, 3), (7, 4), (7, 8), (7, 9), (7, 10),
            (8, 0), (8, 5), (8, 7), (8, 12),
            (9, 0), (9, 5), (9, 7), (9, 12),
            (10, 0), (10, 5), (10, 7), (10, 12),
            (12, 2), (12, 3), (12, 4), (12, 8), (12, 9), (12, 10),
        ],
    },
    Pattern {
        key: "pentadecathlon",
        name: "Pentadecathlon",
        category: PatternCategory::Oscillator,
        cells: &[
            (0, 2), (0, 7),
            (1, 0), (1, 1), (1, 3), (1, 4), (1, 5), (1, 6), (1, 8), (1, 9),
            (2, 2), (2, 7),
        ],
    },
    // --- Spaceships ---
    Pattern {
        key: "glider",
        name: "Glider",
        category: PatternCategory::Spaceship,
        cells: &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)],
    },
    Pattern {
        key: "lwss",
        name: "Lightweight Spaceship",
        category: PatternCategory::Spaceship,
        cells: &[(0, 1), (0, 4), (1, 0), (2, 0), (2, 4), (3, 0), (3, 1), (3, 2), (3, 3)],
    },
    // --- Generators ---
    Pattern {
        key: "gosper_glider_gun",
        name: "Gosper Glider Gun",
        category: PatternCategory::Generator,
        cells: &[
            (0, 24),
            (1, 22), (1, 24),
            (2, 12), (2, 13), (2, 20), (2, 21), (2, 34), (2, 35),
            (3, 11), (3, 15), (3, 20), (3, 21), (3, 34), (3, 35),
            (4, 0), (4, 1), (4, 10), (4, 16), (4, 20), (4, 21),
            (5, 0), (5, 1), (5, 10), (5, 14), (5, 16), (5, 17), (5, 22), (5, 24),
            (6, 10), (6, 16), (6, 24),
            (7, 11), (7, 15),
            (8, 12), (8, 13),
        ],
    },
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn placed(key: &str, rows: u32, cols: u32) -> (Grid, Dimensions) {
        let dims = Dimensions::new(rows, cols);
        (place_pattern(key, dims).unwrap(), dims)
    }

    fn evolve_n(grid: &Grid, dims: Dimensions, n: usize) -> Grid {
        (0..n).fold(grid.clone(), |g, _| g.evolve(dims))
    }

    #[test]
    fn catalog_golden_sizes() {
        let expected: &[(&str, usize, (u32, u32))] = &[
            ("block", 4, (1, 1)),
            ("beehive", 6, (2, 3)),
            ("loaf", 7, (3, 3)),
            ("boat", 5, (2, 2)),
            ("blinker", 3, (0, 2)),
            ("toad", 6, (1, 3)),
            ("beacon", 8, (3, 3)),
            ("pulsar", 48, (12, 12)),
            ("pentadecathlon", 12, (2, 9)),
            ("glider", 5, (2, 2)),
            ("lwss", 9, (3, 4)),
            ("gosper_glider_gun", 36, (8, 35)),
        ];
        assert_eq!(CATALOG.len(), expected.len());
        for &(key, count, extent) in expected {
            let pattern = find(key).unwrap();
            assert_eq!(pattern.cell_count(), count, "{key}");
            assert_eq!(pattern.extent(), extent, "{key}");
        }
    }

    #[test]
    fn catalog_keys_and_cells_are_unique() {
        let keys: BTreeSet<_> = CATALOG.iter().map(|p| p.key).collect();
        assert_eq!(keys.len(), CATALOG.len());
        for pattern in CATALOG {
            let cells: BTreeSet<_> = pattern.cells.iter().collect();
            assert_eq!(cells.len(), pattern.cells.len(), "{}", pattern.key);
        }
    }

    #[test]
    fn every_category_is_populated() {
        for category in PatternCategory::ALL {
            assert!(by_category(category).next().is_some(), "{category}");
        }
        let oscillators: Vec<_> = by_category(PatternCategory::Oscillator)
            .map(|p| p.key)
            .collect();
        assert_eq!(
            oscillators,
            vec!["blinker", "toad", "beacon", "pulsar", "pentadecathlon"]
        );
    }

    #[test]
    fn blinker_is_centered() {
        let (grid, _) = placed("blinker", 10, 10);
        assert_eq!(
            grid.alive_cells(),
            vec![Cell::new(4, 3), Cell::new(4, 4), Cell::new(4, 5)]
        );
    }

    #[test]
    fn block_is_centered_on_smallest_grid() {
        let (grid, _) = placed("block", 5, 5);
        assert_eq!(
            grid.alive_cells(),
            vec![Cell::new(1, 1), Cell::new(1, 2), Cell::new(2, 1), Cell::new(2, 2)]
        );
    }

    #[test]
    fn oversized_pattern_wraps_into_bounds() {
        let (grid, dims) = placed("gosper_glider_gun", 10, 10);
        assert!(grid.fits_within(dims));
        // Overlapping cells collapse once wrapped.
        assert_eq!(grid.alive_count(), 29);
    }

    #[test]
    fn still_lifes_are_fixed_points() {
        for pattern in by_category(PatternCategory::StillLife) {
            let (grid, dims) = placed(pattern.key, 10, 10);
            assert_eq!(grid.evolve(dims), grid, "{}", pattern.key);
        }
    }

    #[test]
    fn small_oscillators_have_period_two() {
        for key in ["blinker", "toad", "beacon"] {
            let (grid, dims) = placed(key, 10, 10);
            assert_ne!(grid.evolve(dims), grid, "{key}");
            assert_eq!(evolve_n(&grid, dims, 2), grid, "{key}");
        }
    }

    #[test]
    fn pulsar_has_period_three() {
        let (grid, dims) = placed("pulsar", 20, 20);
        assert_ne!(grid.evolve(dims), grid);
        assert_eq!(evolve_n(&grid, dims, 3), grid);
    }

    #[test]
    fn pentadecathlon_has_period_fifteen() {
        let (grid, dims) = placed("pentadecathlon", 20, 20);
        assert_eq!(evolve_n(&grid, dims, 15), grid);
    }

    #[test]
    fn glider_moves_diagonally() {
        let (grid, dims) = placed("glider", 10, 10);
        assert_eq!(evolve_n(&grid, dims, 4), grid.translated(1, 1, dims));
    }

    #[test]
    fn lwss_moves_west() {
        let (grid, dims) = placed("lwss", 12, 12);
        assert_eq!(evolve_n(&grid, dims, 4), grid.translated(0, -2, dims));
    }

    #[test]
    fn gun_emits_a_glider_every_thirty_generations() {
        let (grid, dims) = placed("gosper_glider_gun", 50, 60);
        assert_eq!(evolve_n(&grid, dims, 30).alive_count(), 36 + 5);
    }

    #[test]
    fn unknown_key_is_not_found() {
        let result = place_pattern("spaceship_42", Dimensions::new(10, 10));
        assert_eq!(
            result,
            Err(GridError::PatternNotFound {
                key: "spaceship_42".to_owned()
            })
        );
    }

    #[test]
    fn pattern_serializes_for_listing() {
        let json = serde_json::to_value(find("glider").unwrap()).unwrap();
        assert_eq!(json["category"], "spaceship");
        assert_eq!(json["cells"][0], serde_json::json!([0, 1]));
    }
}
