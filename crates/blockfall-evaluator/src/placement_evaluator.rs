//! Placement evaluation: scoring the board a placement would produce.
//!
//! A [`PlacementEvaluator`] maps a hypothetical post-placement grid to a single score,
//! higher being better. The [`PlacementSelector`](crate::selector::PlacementSelector)
//! only relies on this trait, so any scalar-valued scorer can drive it.
//!
//! [`WeightedFeatureEvaluator`] is the standard implementation:
//!
//! ```text
//! score = w₀·f₀ + w₁·f₁ + ... + wₙ·fₙ
//! ```
//!
//! where `fᵢ` are raw (unnormalized) board features and `wᵢ` the coefficients of a
//! [`WeightVector`]. Penalized features such as holes simply receive negative weights.

use std::fmt;

use blockfall_engine::Grid;

use crate::board_feature::{self, ColumnBoundary, FeatureSet, WeightVector};

/// Scores hypothetical boards.
pub trait PlacementEvaluator: fmt::Debug + Send + Sync {
    /// Scores `grid`, the board right after a piece was locked and before any line clear.
    fn evaluate_board(&self, grid: &Grid) -> f32;
}

/// Linear evaluator over the feature set selected by its weight vector.
///
/// # Example
///
/// ```
/// use blockfall_engine::Grid;
/// use blockfall_evaluator::{
///     board_feature::WeightVector,
///     placement_evaluator::{PlacementEvaluator as _, WeightedFeatureEvaluator},
/// };
///
/// let weights = WeightVector::new(vec![-1.0, -0.5, 1.0, -0.5]).unwrap();
/// let evaluator = WeightedFeatureEvaluator::new(weights);
/// assert_eq!(evaluator.evaluate_board(&Grid::standard()), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct WeightedFeatureEvaluator {
    weights: WeightVector,
    column_boundary: ColumnBoundary,
}

impl WeightedFeatureEvaluator {
    #[must_use]
    pub fn new(weights: WeightVector) -> Self {
        Self::with_column_boundary(weights, ColumnBoundary::default())
    }

    #[must_use]
    pub fn with_column_boundary(weights: WeightVector, column_boundary: ColumnBoundary) -> Self {
        Self {
            weights,
            column_boundary,
        }
    }

    #[must_use]
    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    #[must_use]
    pub fn feature_set(&self) -> FeatureSet {
        self.weights.feature_set()
    }
}

impl PlacementEvaluator for WeightedFeatureEvaluator {
    #[inline]
    fn evaluate_board(&self, grid: &Grid) -> f32 {
        let features =
            board_feature::extract_features_with(grid, self.feature_set(), self.column_boundary);
        board_feature::dot(&features, self.weights.as_slice())
    }
}
