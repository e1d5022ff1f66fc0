pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PlacementError {
    #[display("piece {kind} has no rotation state {rotation}")]
    UnknownRotation { kind: PieceKind, rotation: usize },
    #[display("piece {kind} cannot land with rotation {rotation} at column {x}")]
    NoLanding {
        kind: PieceKind,
        rotation: usize,
        x: i32,
    },
}
