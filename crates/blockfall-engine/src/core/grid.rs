use std::{fmt, iter};

use crate::core::piece::RotationState;

/// Widest grid a [`BitRow`] can hold.
pub const MAX_WIDTH: usize = 32;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum GridError {
    #[display("grid must have at least one row and one column, got {width}x{height}")]
    EmptyDimension { width: usize, height: usize },
    #[display("grid width {width} exceeds the maximum of {MAX_WIDTH} columns")]
    TooWide { width: usize },
    #[display("grid row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Single row of the grid.
///
/// Stores one row as a 32-bit mask; bit `x` is set when column `x` is occupied.
/// Bits at or beyond the grid width are never set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BitRow {
    bits: u32,
}

impl BitRow {
    pub const EMPTY: Self = Self { bits: 0 };

    #[inline]
    const fn full_mask(width: usize) -> u32 {
        if width >= MAX_WIDTH {
            u32::MAX
        } else {
            (1 << width) - 1
        }
    }

    /// Checks if every cell of a row `width` cells wide is occupied.
    #[inline]
    #[must_use]
    pub fn is_filled(self, width: usize) -> bool {
        let mask = Self::full_mask(width);
        (self.bits & mask) == mask
    }

    /// Checks if the cell at column `x` is occupied.
    #[inline]
    #[must_use]
    pub fn is_cell_occupied(self, x: usize) -> bool {
        (self.bits >> x) & 1 != 0
    }

    #[inline]
    fn occupy_cell(&mut self, x: usize) {
        self.bits |= 1 << x;
    }

    /// Number of occupied cells in the row.
    #[inline]
    #[must_use]
    pub fn occupied_count(self) -> u32 {
        self.bits.count_ones()
    }

    /// Iterates over the first `width` cells, returning their occupied status.
    #[inline]
    pub fn iter_cells(self, width: usize) -> impl Iterator<Item = bool> {
        (0..width).map(move |x| self.is_cell_occupied(x))
    }
}

/// The occupancy grid of a game.
///
/// Row 0 is the top row and row indices grow downward; column 0 is the leftmost
/// column. Cells outside the grid are treated as walls by every collision query.
///
/// # Example
///
/// ```
/// use blockfall_engine::Grid;
///
/// let mut grid = Grid::standard();
/// grid.lock((0..10).map(|x| (x, 19)));
/// assert_eq!(grid.full_row_count(), 1);
/// assert_eq!(grid.clear_full_rows(), 1);
/// assert!(!grid.is_occupied(19, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    rows: Vec<BitRow>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::standard()
    }
}

impl Grid {
    pub const STANDARD_WIDTH: usize = 10;
    pub const STANDARD_HEIGHT: usize = 20;

    /// Creates an empty grid with the given dimensions.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyDimension { width, height });
        }
        if width > MAX_WIDTH {
            return Err(GridError::TooWide { width });
        }
        Ok(Self {
            width,
            rows: vec![BitRow::EMPTY; height],
        })
    }

    /// Creates an empty 10-column, 20-row grid.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            width: Self::STANDARD_WIDTH,
            rows: vec![BitRow::EMPTY; Self::STANDARD_HEIGHT],
        }
    }

    /// Builds a grid from an occupancy matrix, one inner slice per row from top to bottom.
    pub fn from_matrix<R>(matrix: &[R]) -> Result<Self, GridError>
    where
        R: AsRef<[bool]>,
    {
        let width = matrix.first().map_or(0, |row| row.as_ref().len());
        let mut grid = Self::new(width, matrix.len())?;
        for (y, (cells, row)) in iter::zip(matrix, &mut grid.rows).enumerate() {
            let cells = cells.as_ref();
            if cells.len() != width {
                return Err(GridError::RaggedRow {
                    row: y,
                    expected: width,
                    actual: cells.len(),
                });
            }
            for (x, _) in cells.iter().enumerate().filter(|(_, occupied)| **occupied) {
                row.occupy_cell(x);
            }
        }
        Ok(grid)
    }

    /// Returns the grid as an occupancy matrix, one `Vec` per row from top to bottom.
    #[must_use]
    pub fn to_matrix(&self) -> Vec<Vec<bool>> {
        self.rows
            .iter()
            .map(|row| row.iter_cells(self.width).collect())
            .collect()
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn row(&self, y: usize) -> BitRow {
        self.rows[y]
    }

    pub fn rows(&self) -> impl DoubleEndedIterator<Item = BitRow> + '_ {
        self.rows.iter().copied()
    }

    /// Checks if the cell at (`row`, `col`) is occupied.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates lie outside the grid.
    #[must_use]
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        assert!(
            col < self.width,
            "column {col} out of range (width {})",
            self.width
        );
        self.rows[row].is_cell_occupied(col)
    }

    /// Converts signed (`x`, `y`) coordinates to indices when they lie inside the grid.
    fn index_of(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let x = usize::try_from(x).ok().filter(|x| *x < self.width)?;
        let y = usize::try_from(y).ok().filter(|y| *y < self.rows.len())?;
        Some((x, y))
    }

    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index_of(x, y).is_some()
    }

    /// Checks if (`x`, `y`) is inside the grid and empty.
    #[must_use]
    pub fn is_vacant(&self, x: i32, y: i32) -> bool {
        self.index_of(x, y)
            .is_some_and(|(x, y)| !self.rows[y].is_cell_occupied(x))
    }

    /// Height of column `x`, measured from the floor up to its topmost occupied cell.
    #[must_use]
    pub fn column_height(&self, x: usize) -> usize {
        self.rows
            .iter()
            .position(|row| row.is_cell_occupied(x))
            .map_or(0, |top| self.rows.len() - top)
    }

    /// Marks the given absolute (`x`, `y`) cells as occupied.
    ///
    /// Cells outside the grid are skipped. A piece resting partially above row 0
    /// therefore locks only its visible cells.
    pub fn lock<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (i32, i32)>,
    {
        for (x, y) in cells {
            if let Some((x, y)) = self.index_of(x, y) {
                self.rows[y].occupy_cell(x);
            }
        }
    }

    /// Counts fully occupied rows without modifying the grid.
    #[must_use]
    pub fn full_row_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.is_filled(self.width))
            .count()
    }

    /// Removes every fully occupied row and returns how many were removed.
    ///
    /// Rows above a removed row move down by one for each removed row beneath them;
    /// the freed rows at the top become empty.
    pub fn clear_full_rows(&mut self) -> usize {
        let mut count = 0;
        for y in (0..self.rows.len()).rev() {
            if self.rows[y].is_filled(self.width) {
                count += 1;
                continue;
            }
            if count > 0 {
                self.rows[y + count] = self.rows[y];
            }
        }
        self.rows[..count].fill(BitRow::EMPTY);
        count
    }

    /// Checks if `rotation` anchored at (`x`, `y`) lies inside the grid on empty cells only.
    #[must_use]
    pub fn fits(&self, rotation: &RotationState, x: i32, y: i32) -> bool {
        rotation
            .cells_at(x, y)
            .all(|(cx, cy)| self.is_vacant(cx, cy))
    }

    /// Finds the row where `rotation` comes to rest when dropped at column offset `x`.
    ///
    /// Candidate rows are scanned from the lowest row the shape can occupy (its deepest
    /// cell on the floor) upward to row 0, and the first row where the shape fits is
    /// returned. Returns `None` when no row fits.
    #[must_use]
    pub fn landing_row(&self, rotation: &RotationState, x: i32) -> Option<i32> {
        #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let lowest = self.rows.len() as i32 - 1 - i32::from(rotation.max_dy());
        (0..=lowest).rev().find(|&y| self.fits(rotation, x, y))
    }

    /// Creates a grid from ASCII art for testing.
    ///
    /// '#' represents an occupied cell and '.' an empty one. Rows are given from top to
    /// bottom; blank lines are ignored and the width is taken from the first row.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let matrix: Vec<Vec<bool>> = art
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                line.chars()
                    .filter(|c| *c == '#' || *c == '.')
                    .map(|c| c == '#')
                    .collect()
            })
            .collect();
        match Self::from_matrix(&matrix) {
            Ok(grid) => grid,
            Err(e) => panic!("invalid grid art: {e}"),
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            for occupied in row.iter_cells(self.width) {
                f.write_str(if occupied { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(grid: &mut Grid, y: i32) {
        #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let width = grid.width() as i32;
        grid.lock((0..width).map(|x| (x, y)));
    }

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(7, 5).unwrap();
        assert_eq!(grid.width(), 7);
        assert_eq!(grid.height(), 5);
        for y in 0..5 {
            for x in 0..7 {
                assert!(!grid.is_occupied(y, x));
            }
        }
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            Grid::new(0, 20),
            Err(GridError::EmptyDimension { .. })
        ));
        assert!(matches!(
            Grid::new(10, 0),
            Err(GridError::EmptyDimension { .. })
        ));
        assert!(matches!(
            Grid::new(33, 20),
            Err(GridError::TooWide { width: 33 })
        ));
        assert!(Grid::new(32, 1).is_ok());
    }

    #[test]
    fn test_from_matrix_rejects_ragged_rows() {
        let matrix = vec![vec![false; 4], vec![false; 3]];
        assert!(matches!(
            Grid::from_matrix(&matrix),
            Err(GridError::RaggedRow {
                row: 1,
                expected: 4,
                actual: 3
            })
        ));
        let empty: Vec<Vec<bool>> = vec![];
        assert!(Grid::from_matrix(&empty).is_err());
    }

    #[test]
    fn test_matrix_conversion_preserves_cells() {
        let matrix = vec![
            vec![false, true, false],
            vec![true, true, false],
            vec![true, true, true],
        ];
        let grid = Grid::from_matrix(&matrix).unwrap();
        assert!(grid.is_occupied(0, 1));
        assert!(!grid.is_occupied(0, 0));
        assert_eq!(grid.to_matrix(), matrix);
    }

    #[test]
    fn test_lock_ignores_cells_outside_grid() {
        let mut grid = Grid::standard();
        grid.lock([(3, -1), (3, 0), (-1, 5), (10, 5), (4, 20)]);
        assert!(grid.is_occupied(0, 3));
        let occupied: u32 = grid.rows().map(BitRow::occupied_count).sum();
        assert_eq!(occupied, 1);
    }

    #[test]
    fn test_is_vacant_outside_grid() {
        let grid = Grid::standard();
        assert!(grid.is_vacant(0, 0));
        assert!(grid.is_vacant(9, 19));
        assert!(!grid.is_vacant(-1, 0));
        assert!(!grid.is_vacant(10, 0));
        assert!(!grid.is_vacant(0, -1));
        assert!(!grid.is_vacant(0, 20));
    }

    #[test]
    fn test_column_height() {
        let grid = Grid::from_ascii(
            "
            .....
            .#...
            .....
            ##...
            ",
        );
        assert_eq!(grid.column_height(0), 1);
        assert_eq!(grid.column_height(1), 3);
        assert_eq!(grid.column_height(2), 0);
    }

    #[test]
    fn test_clear_full_rows_single_line() {
        let mut grid = Grid::standard();
        fill_row(&mut grid, 19);
        grid.lock([(0, 18)]);

        assert_eq!(grid.full_row_count(), 1);
        assert_eq!(grid.clear_full_rows(), 1);

        // The lone cell above moves down into the cleared row
        assert!(grid.is_occupied(19, 0));
        assert!(!grid.is_occupied(18, 0));
        assert_eq!(grid.full_row_count(), 0);
    }

    #[test]
    fn test_clear_full_rows_non_adjacent() {
        let mut grid = Grid::from_ascii(
            "
            ....
            #...
            ####
            .#..
            ####
            ",
        );
        assert_eq!(grid.clear_full_rows(), 2);
        let expected = Grid::from_ascii(
            "
            ....
            ....
            ....
            #...
            .#..
            ",
        );
        assert_eq!(grid, expected);
    }

    #[test]
    fn test_clear_full_rows_partial_line() {
        let mut grid = Grid::standard();
        grid.lock((0..9).map(|x| (x, 19)));
        assert_eq!(grid.clear_full_rows(), 0);
        assert_eq!(grid.row(19).occupied_count(), 9);
    }

    #[test]
    fn test_clear_full_rows_all_filled() {
        let mut grid = Grid::new(4, 6).unwrap();
        for y in 0..6 {
            fill_row(&mut grid, y);
        }
        assert_eq!(grid.clear_full_rows(), 6);
        assert_eq!(grid, Grid::new(4, 6).unwrap());
    }

    #[test]
    fn test_full_width_row_mask() {
        let mut grid = Grid::new(MAX_WIDTH, 2).unwrap();
        fill_row(&mut grid, 1);
        assert!(grid.row(1).is_filled(MAX_WIDTH));
        assert_eq!(grid.clear_full_rows(), 1);
    }

    #[test]
    fn test_display_round_trips_ascii() {
        let art = "..#\n#.#\n";
        let grid = Grid::from_ascii(art);
        assert_eq!(grid.to_string(), art);
    }
}
