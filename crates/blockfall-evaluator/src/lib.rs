//! Decision layer for choosing piece placements and scoring whole games.
//!
//! # Architecture
//!
//! ```text
//! Session Evaluation (fitness of a weight vector over whole games)
//!     ↓ uses
//! Placement Selection (best landing for the current piece)
//!     ↓ uses
//! Placement Enumeration (all legal landings) + Placement Evaluation (score one board)
//! ```
//!
//! - [`placement`] - every legal landing of a piece, in a fixed order
//! - [`board_analysis`] - lazily computed board metrics (heights, holes, transitions)
//! - [`board_feature`] - feature vectors, feature sets, and weight vectors
//! - [`placement_evaluator`] - the [`PlacementEvaluator`](placement_evaluator::PlacementEvaluator)
//!   trait and its weighted linear implementation
//! - [`selector`] - greedy best-landing selection and the random baseline
//! - [`session_evaluator`] - simulated games and fitness functions
//!
//! # Example
//!
//! ```
//! use blockfall_engine::{Grid, PieceCatalog, PieceKind};
//! use blockfall_evaluator::{
//!     board_feature::WeightVector, placement_evaluator::WeightedFeatureEvaluator,
//!     selector::PlacementSelector,
//! };
//!
//! let catalog = PieceCatalog::standard();
//! let weights = WeightVector::new(vec![-4.0, -0.2, 3.0, -0.5]).unwrap();
//! let selector = PlacementSelector::new(catalog, Box::new(WeightedFeatureEvaluator::new(weights)));
//!
//! let (landing, _score) = selector.select(PieceKind::T, &Grid::standard()).unwrap();
//! assert_eq!(landing.row, 19);
//! ```

pub mod board_analysis;
pub mod board_feature;
pub mod placement;
pub mod placement_evaluator;
pub mod selector;
pub mod session_evaluator;
