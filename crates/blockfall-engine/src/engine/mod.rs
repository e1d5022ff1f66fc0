//! Headless game loop built on the board model.
//!
//! - [`GameField`] - grid, active piece kind, and upcoming pieces
//! - [`GameStats`] - score, level, and line-clear bookkeeping
//! - [`PieceBuffer`] - seeded piece generation (7-bag or uniform)
//! - [`PieceSeed`] - seed for deterministic piece generation
//!
//! # Game Flow
//!
//! 1. Build a [`GameField`] from a [`PieceGeneration`] mode and a [`PieceSeed`]
//! 2. Choose a [`Placement`](crate::Placement) for the active piece
//! 3. Apply it with [`GameField::apply_placement`], which locks the piece, clears full
//!    rows, and draws the next piece
//! 4. Feed the cleared line count into [`GameStats`]
//! 5. Repeat until no legal placement remains
//!
//! # Example
//!
//! ```
//! use blockfall_engine::{GameField, GameStats, PieceCatalog, PieceGeneration, Placement};
//! use rand::Rng as _;
//!
//! let catalog = PieceCatalog::standard();
//! let mut field = GameField::new(PieceGeneration::SevenBag, rand::rng().random());
//! let mut stats = GameStats::new();
//!
//! let cleared = field.apply_placement(catalog, Placement::new(0, 4)).unwrap();
//! stats.complete_piece_drop(cleared);
//! assert_eq!(stats.completed_pieces(), 1);
//! ```

pub use self::{game_field::*, game_stats::*, piece_buffer::*};

mod game_field;
mod game_stats;
mod piece_buffer;
