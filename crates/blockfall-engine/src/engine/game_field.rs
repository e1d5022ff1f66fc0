use crate::{
    PlacementError,
    core::{
        grid::Grid,
        piece::{PieceCatalog, PieceKind},
        placement::{Landing, Placement},
    },
};

use super::piece_buffer::{PieceBuffer, PieceGeneration, PieceSeed};

/// State of one headless game: the grid, the piece to place, and the upcoming pieces.
#[derive(Debug, Clone)]
pub struct GameField {
    grid: Grid,
    current: PieceKind,
    piece_buffer: PieceBuffer,
}

impl GameField {
    /// Starts a game on an empty standard grid.
    #[must_use]
    pub fn new(generation: PieceGeneration, seed: PieceSeed) -> Self {
        Self::with_grid(Grid::standard(), PieceBuffer::with_seed(generation, seed))
    }

    /// Starts a game on `grid`, taking the first piece from `piece_buffer`.
    #[must_use]
    pub fn with_grid(grid: Grid, mut piece_buffer: PieceBuffer) -> Self {
        let current = piece_buffer.pop_next();
        Self {
            grid,
            current,
            piece_buffer,
        }
    }

    /// Resumes a game on `grid` with `current` as the piece to place.
    #[must_use]
    pub fn from_parts(grid: Grid, current: PieceKind, piece_buffer: PieceBuffer) -> Self {
        Self {
            grid,
            current,
            piece_buffer,
        }
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn current_kind(&self) -> PieceKind {
        self.current
    }

    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.piece_buffer.next_pieces()
    }

    /// Drops the current piece with `placement`, then draws the next piece.
    ///
    /// The landing row is recomputed against the current grid. The piece cells are
    /// locked and full rows are cleared in one step; the number of cleared rows is
    /// returned. On error the field is left unchanged.
    pub fn apply_placement(
        &mut self,
        catalog: &PieceCatalog,
        placement: Placement,
    ) -> Result<usize, PlacementError> {
        let landing = self.landing(catalog, placement)?;
        self.grid.lock(landing.cells(catalog));
        let cleared_lines = self.grid.clear_full_rows();
        self.current = self.piece_buffer.pop_next();
        Ok(cleared_lines)
    }

    /// Computes where the current piece would rest with `placement`.
    pub fn landing(
        &self,
        catalog: &PieceCatalog,
        placement: Placement,
    ) -> Result<Landing, PlacementError> {
        let kind = self.current;
        let Placement { rotation, x } = placement;
        let state = catalog
            .rotation(kind, rotation)
            .ok_or(PlacementError::UnknownRotation { kind, rotation })?;
        let row = self
            .grid
            .landing_row(state, x)
            .ok_or(PlacementError::NoLanding { kind, rotation, x })?;
        Ok(Landing {
            kind,
            placement,
            row,
        })
    }
}
