//! Board model: the occupancy grid, piece kinds, and the rotation catalog.

pub use self::{grid::*, piece::*, placement::*};

pub(crate) mod grid;
pub(crate) mod piece;
pub(crate) mod placement;
