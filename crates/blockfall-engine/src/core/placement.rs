use serde::{Deserialize, Serialize};

use crate::core::piece::{PieceCatalog, PieceKind, RotationState};

/// Where a piece is dropped: a rotation index into the catalog and the column offset
/// of the piece pivot.
///
/// A placement is only meaningful relative to a particular grid and piece kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub rotation: usize,
    pub x: i32,
}

impl Placement {
    #[must_use]
    pub const fn new(rotation: usize, x: i32) -> Self {
        Self { rotation, x }
    }
}

/// A legal placement together with the row its pivot comes to rest on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landing {
    pub kind: PieceKind,
    pub placement: Placement,
    pub row: i32,
}

impl Landing {
    /// Rotation state of the landed piece.
    ///
    /// Returns `None` if `catalog` is not the catalog the landing was computed with
    /// and lacks the rotation.
    #[must_use]
    pub fn rotation_state<'a>(&self, catalog: &'a PieceCatalog) -> Option<&'a RotationState> {
        catalog.rotation(self.kind, self.placement.rotation)
    }

    /// Absolute (`x`, `y`) cells the landed piece occupies.
    pub fn cells<'a>(&self, catalog: &'a PieceCatalog) -> impl Iterator<Item = (i32, i32)> + 'a {
        let (x, y) = (self.placement.x, self.row);
        self.rotation_state(catalog)
            .into_iter()
            .flat_map(move |rotation| rotation.cells_at(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_cells() {
        let catalog = PieceCatalog::standard();
        let landing = Landing {
            kind: PieceKind::O,
            placement: Placement::new(0, 4),
            row: 19,
        };
        let mut cells: Vec<_> = landing.cells(catalog).collect();
        cells.sort_unstable();
        assert_eq!(cells, [(4, 18), (4, 19), (5, 18), (5, 19)]);
    }

    #[test]
    fn test_landing_with_unknown_rotation_has_no_cells() {
        let landing = Landing {
            kind: PieceKind::T,
            placement: Placement::new(9, 0),
            row: 0,
        };
        assert_eq!(landing.cells(PieceCatalog::standard()).count(), 0);
    }
}
