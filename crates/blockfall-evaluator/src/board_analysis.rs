//! Lazily computed board metrics.
//!
//! [`BoardAnalysis`] wraps a borrowed [`Grid`] and computes each metric on first access,
//! caching it for later queries. Features read the metrics they need, so a minimal
//! feature set never pays for transition counts.

use std::{cell::OnceCell, iter};

use blockfall_engine::Grid;
use serde::{Deserialize, Serialize};

/// Convention for the boundaries used when counting column transitions.
///
/// Two conventions are in common use and they disagree about which end of a column
/// counts as a wall, so the choice is left to the caller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnBoundary {
    /// The space above row 0 counts as occupied and the floor is not a boundary.
    #[default]
    TopWall,
    /// The space above row 0 counts as empty and the floor counts as occupied.
    Floor,
}

#[derive(Debug)]
pub struct BoardAnalysis<'a> {
    grid: &'a Grid,
    column_heights: OnceCell<Vec<u32>>,
    max_height: OnceCell<u32>,
    total_height: OnceCell<u32>,
    num_holes: OnceCell<u32>,
    bumpiness: OnceCell<u32>,
    well_depth_sum: OnceCell<u32>,
    full_rows: OnceCell<u32>,
    row_transitions: OnceCell<u32>,
    column_transitions: OnceCell<u32>,
    column_boundary: ColumnBoundary,
}

impl<'a> BoardAnalysis<'a> {
    #[must_use]
    pub fn new(grid: &'a Grid, column_boundary: ColumnBoundary) -> Self {
        Self {
            grid,
            column_heights: OnceCell::new(),
            max_height: OnceCell::new(),
            total_height: OnceCell::new(),
            num_holes: OnceCell::new(),
            bumpiness: OnceCell::new(),
            well_depth_sum: OnceCell::new(),
            full_rows: OnceCell::new(),
            row_transitions: OnceCell::new(),
            column_transitions: OnceCell::new(),
            column_boundary,
        }
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        self.grid
    }

    #[must_use]
    pub fn column_boundary(&self) -> ColumnBoundary {
        self.column_boundary
    }

    /// Height of every column, from the floor to its topmost occupied cell.
    #[must_use]
    pub fn column_heights(&self) -> &[u32] {
        self.column_heights.get_or_init(|| {
            (0..self.grid.width())
                .map(|x| to_u32(self.grid.column_height(x)))
                .collect()
        })
    }

    #[must_use]
    pub fn max_height(&self) -> u32 {
        *self
            .max_height
            .get_or_init(|| self.column_heights().iter().copied().max().unwrap_or(0))
    }

    #[must_use]
    pub fn total_height(&self) -> u32 {
        *self
            .total_height
            .get_or_init(|| self.column_heights().iter().sum())
    }

    /// Empty cells lying below the topmost occupied cell of their column.
    #[must_use]
    pub fn num_holes(&self) -> u32 {
        *self.num_holes.get_or_init(|| {
            let height = self.grid.height();
            iter::zip(0.., self.column_heights())
                .map(|(x, h)| {
                    let top = height - *h as usize;
                    let occupied = (top..height)
                        .filter(|y| self.grid.is_occupied(*y, x))
                        .count();
                    *h - to_u32(occupied)
                })
                .sum()
        })
    }

    /// Sum of absolute height differences between adjacent columns.
    #[must_use]
    pub fn bumpiness(&self) -> u32 {
        *self.bumpiness.get_or_init(|| {
            self.column_heights()
                .windows(2)
                .map(|w| w[0].abs_diff(w[1]))
                .sum()
        })
    }

    /// Total depth of wells in interior columns.
    ///
    /// A column lower than both neighbours contributes the sum of its height
    /// differences to the left and right neighbour. Edge columns never count.
    #[must_use]
    pub fn well_depth_sum(&self) -> u32 {
        *self.well_depth_sum.get_or_init(|| {
            self.column_heights()
                .windows(3)
                .filter(|w| w[1] < w[0] && w[1] < w[2])
                .map(|w| (w[0] - w[1]) + (w[2] - w[1]))
                .sum()
        })
    }

    /// Number of fully occupied rows.
    #[must_use]
    pub fn full_rows(&self) -> u32 {
        *self
            .full_rows
            .get_or_init(|| to_u32(self.grid.full_row_count()))
    }

    /// Occupancy changes along each row, with both side walls counted as occupied.
    #[must_use]
    pub fn row_transitions(&self) -> u32 {
        *self.row_transitions.get_or_init(|| {
            let width = self.grid.width();
            self.grid
                .rows()
                .map(|row| {
                    let cells = iter::once(true)
                        .chain(row.iter_cells(width))
                        .chain(iter::once(true));
                    count_changes(cells)
                })
                .sum()
        })
    }

    /// Occupancy changes down each column, bounded according to [`ColumnBoundary`].
    #[must_use]
    pub fn column_transitions(&self) -> u32 {
        *self.column_transitions.get_or_init(|| {
            let (top, floor) = match self.column_boundary {
                ColumnBoundary::TopWall => (Some(true), None),
                ColumnBoundary::Floor => (None, Some(true)),
            };
            (0..self.grid.width())
                .map(|x| {
                    let cells = top
                        .into_iter()
                        .chain(self.grid.rows().map(|row| row.is_cell_occupied(x)))
                        .chain(floor);
                    count_changes(cells)
                })
                .sum()
        })
    }
}

fn count_changes<I>(cells: I) -> u32
where
    I: IntoIterator<Item = bool>,
{
    let mut cells = cells.into_iter();
    let Some(mut prev) = cells.next() else {
        return 0;
    };
    let mut changes = 0;
    for occupied in cells {
        if occupied != prev {
            changes += 1;
        }
        prev = occupied;
    }
    changes
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
