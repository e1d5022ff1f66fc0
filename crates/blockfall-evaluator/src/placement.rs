//! Enumeration of every legal landing for a piece.
//!
//! For each rotation state, in catalog order, the pivot column `x` ranges over every
//! offset that keeps the shape inside the side walls. The piece is dropped straight down
//! at each offset: candidate rows are scanned from the floor upward and the first row
//! where the shape fits is its landing row. Offsets with no fitting row produce no
//! landing. Results are ordered by rotation, then by `x`, which is the tie-break order
//! used by [`PlacementSelector`](crate::selector::PlacementSelector).

use blockfall_engine::{Grid, Landing, PieceCatalog, PieceKind, Placement};

#[derive(Debug, Clone, Copy)]
pub struct PlacementEnumerator<'a> {
    catalog: &'a PieceCatalog,
}

impl<'a> PlacementEnumerator<'a> {
    #[must_use]
    pub fn new(catalog: &'a PieceCatalog) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &'a PieceCatalog {
        self.catalog
    }

    /// Lazily yields every legal landing of `kind` on `grid`.
    pub fn landings<'g>(
        &self,
        kind: PieceKind,
        grid: &'g Grid,
    ) -> impl Iterator<Item = Landing> + use<'a, 'g> {
        #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let width = grid.width() as i32;
        self.catalog
            .rotations(kind)
            .iter()
            .enumerate()
            .flat_map(move |(rotation, state)| {
                let min_x = -i32::from(state.min_dx());
                let max_x = width - i32::from(state.max_dx());
                (min_x..max_x).filter_map(move |x| {
                    let row = grid.landing_row(state, x)?;
                    Some(Landing {
                        kind,
                        placement: Placement::new(rotation, x),
                        row,
                    })
                })
            })
    }

    /// Collects every legal landing of `kind` on `grid`.
    ///
    /// An empty result means the piece has nowhere to go.
    #[must_use]
    pub fn enumerate(&self, kind: PieceKind, grid: &Grid) -> Vec<Landing> {
        self.landings(kind, grid).collect()
    }
}
