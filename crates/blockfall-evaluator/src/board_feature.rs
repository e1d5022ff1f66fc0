//! Board features and the weight vectors that combine them.
//!
//! A [`Feature`] reads one measurement from a [`BoardAnalysis`]. Features always come in
//! the fixed order of [`Feature::ALL`]:
//!
//! | # | Feature | Measures |
//! |---|---|---|
//! | 0 | [`Feature::Holes`] | empty cells covered by an occupied cell in the same column |
//! | 1 | [`Feature::Bumpiness`] | sum of height differences between adjacent columns |
//! | 2 | [`Feature::LinesCleared`] | fully occupied rows |
//! | 3 | [`Feature::TotalHeight`] | sum of column heights |
//! | 4 | [`Feature::MaxHeight`] | tallest column |
//! | 5 | [`Feature::Wells`] | depth of interior wells |
//! | 6 | [`Feature::RowTransitions`] | occupancy changes along rows |
//! | 7 | [`Feature::ColTransitions`] | occupancy changes down columns |
//!
//! [`FeatureSet::Minimal`] uses the first four, [`FeatureSet::Extended`] all eight. A
//! [`WeightVector`] holds one coefficient per feature, and its length alone decides
//! which set is active.

use std::{fmt, iter, str::FromStr};

use arrayvec::ArrayVec;
use blockfall_engine::Grid;
use serde::{Deserialize, Serialize};

pub use crate::board_analysis::ColumnBoundary;
use crate::board_analysis::BoardAnalysis;

/// Length of the extended feature set.
pub const MAX_FEATURES: usize = 8;

/// Ordered feature measurements of one board.
pub type FeatureVector = ArrayVec<f32, MAX_FEATURES>;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum WeightError {
    #[display("unsupported weight vector length {len} (expected 4 or 8)")]
    UnsupportedLength { len: usize },
    #[display("{weights} weights cannot score {features} features")]
    LengthMismatch { weights: usize, features: usize },
    #[display("weight #{index} is not a finite number")]
    NonFinite { index: usize },
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("unknown feature set: {input:?} (expected \"minimal\" or \"extended\")")]
pub struct FeatureSetParseError {
    input: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Holes,
    Bumpiness,
    LinesCleared,
    TotalHeight,
    MaxHeight,
    Wells,
    RowTransitions,
    ColTransitions,
}

impl Feature {
    pub const ALL: [Self; MAX_FEATURES] = [
        Self::Holes,
        Self::Bumpiness,
        Self::LinesCleared,
        Self::TotalHeight,
        Self::MaxHeight,
        Self::Wells,
        Self::RowTransitions,
        Self::ColTransitions,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Holes => "holes",
            Self::Bumpiness => "bumpiness",
            Self::LinesCleared => "lines_cleared",
            Self::TotalHeight => "total_height",
            Self::MaxHeight => "max_height",
            Self::Wells => "wells",
            Self::RowTransitions => "row_transitions",
            Self::ColTransitions => "col_transitions",
        }
    }

    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn extract(self, analysis: &BoardAnalysis) -> f32 {
        let raw = match self {
            Self::Holes => analysis.num_holes(),
            Self::Bumpiness => analysis.bumpiness(),
            Self::LinesCleared => analysis.full_rows(),
            Self::TotalHeight => analysis.total_height(),
            Self::MaxHeight => analysis.max_height(),
            Self::Wells => analysis.well_depth_sum(),
            Self::RowTransitions => analysis.row_transitions(),
            Self::ColTransitions => analysis.column_transitions(),
        };
        raw as f32
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const MINIMAL_FEATURES: [Feature; 4] = [
    Feature::Holes,
    Feature::Bumpiness,
    Feature::LinesCleared,
    Feature::TotalHeight,
];

/// Which features a weight vector scores.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::IsVariant,
)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureSet {
    Minimal,
    #[default]
    Extended,
}

impl FeatureSet {
    #[must_use]
    pub const fn features(self) -> &'static [Feature] {
        match self {
            Self::Minimal => &MINIMAL_FEATURES,
            Self::Extended => &Feature::ALL,
        }
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.features().len()
    }

    /// Feature set scored by a weight vector of length `len`.
    pub fn from_len(len: usize) -> Result<Self, WeightError> {
        [Self::Minimal, Self::Extended]
            .into_iter()
            .find(|set| set.len() == len)
            .ok_or(WeightError::UnsupportedLength { len })
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Extended => "extended",
        }
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureSet {
    type Err = FeatureSetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimal" | "4" => Ok(Self::Minimal),
            "extended" | "8" => Ok(Self::Extended),
            _ => Err(FeatureSetParseError { input: s.to_owned() }),
        }
    }
}

/// Measures `grid` with the features of `feature_set`, counting column transitions
/// with the default [`ColumnBoundary`].
#[must_use]
pub fn extract_features(grid: &Grid, feature_set: FeatureSet) -> FeatureVector {
    extract_features_with(grid, feature_set, ColumnBoundary::default())
}

#[must_use]
pub fn extract_features_with(
    grid: &Grid,
    feature_set: FeatureSet,
    column_boundary: ColumnBoundary,
) -> FeatureVector {
    let analysis = BoardAnalysis::new(grid, column_boundary);
    feature_set
        .features()
        .iter()
        .map(|feature| feature.extract(&analysis))
        .collect()
}

/// Weighted sum of `features`. The two slices must have equal length.
pub fn score(features: &[f32], weights: &[f32]) -> Result<f32, WeightError> {
    if features.len() != weights.len() {
        return Err(WeightError::LengthMismatch {
            weights: weights.len(),
            features: features.len(),
        });
    }
    Ok(dot(features, weights))
}

pub(crate) fn dot(features: &[f32], weights: &[f32]) -> f32 {
    iter::zip(features, weights).map(|(f, w)| f * w).sum()
}

/// One finite coefficient per feature, 4 or 8 long.
///
/// Serialized as a plain JSON array of numbers; deserialization applies the same checks
/// as [`WeightVector::new`].
///
/// # Example
///
/// ```
/// use blockfall_evaluator::board_feature::{FeatureSet, WeightVector};
///
/// let weights = WeightVector::new(vec![-0.5, -0.2, 0.8, -0.5]).unwrap();
/// assert_eq!(weights.feature_set(), FeatureSet::Minimal);
/// assert!(WeightVector::new(vec![1.0; 5]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct WeightVector(Vec<f32>);

impl WeightVector {
    pub fn new(weights: Vec<f32>) -> Result<Self, WeightError> {
        FeatureSet::from_len(weights.len())?;
        if let Some(index) = weights.iter().position(|w| !w.is_finite()) {
            return Err(WeightError::NonFinite { index });
        }
        Ok(Self(weights))
    }

    /// Builds a vector for `feature_set`, calling `f` once per feature in order.
    pub fn from_fn<F>(feature_set: FeatureSet, f: F) -> Self
    where
        F: FnMut(&Feature) -> f32,
    {
        Self(feature_set.features().iter().map(f).collect())
    }

    /// Builds a vector of the same length by calling `f` with each index and coefficient.
    #[must_use]
    pub fn map<F>(&self, mut f: F) -> Self
    where
        F: FnMut(usize, f32) -> f32,
    {
        Self(self.0.iter().enumerate().map(|(i, w)| f(i, *w)).collect())
    }

    #[must_use]
    pub fn feature_set(&self) -> FeatureSet {
        if self.0.len() == FeatureSet::Minimal.len() {
            FeatureSet::Minimal
        } else {
            FeatureSet::Extended
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl AsRef<[f32]> for WeightVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

impl TryFrom<Vec<f32>> for WeightVector {
    type Error = WeightError;

    fn try_from(weights: Vec<f32>) -> Result<Self, Self::Error> {
        Self::new(weights)
    }
}

impl From<WeightVector> for Vec<f32> {
    fn from(weights: WeightVector) -> Self {
        weights.0
    }
}

impl fmt::Display for WeightVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, w) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{w:+.4}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> Grid {
        Grid::from_ascii(
            "
            .....
            ..#..
            #.#..
            ##.##
            ",
        )
    }

    #[test]
    fn test_extract_minimal_features() {
        let features = extract_features(&sample_grid(), FeatureSet::Minimal);
        assert_eq!(features.as_slice(), [1.0, 5.0, 0.0, 8.0]);
    }

    #[test]
    fn test_extract_extended_features() {
        let features = extract_features(&sample_grid(), FeatureSet::Extended);
        assert_eq!(
            features.as_slice(),
            [1.0, 5.0, 0.0, 8.0, 3.0, 3.0, 12.0, 11.0]
        );

        let floor = extract_features_with(&sample_grid(), FeatureSet::Extended, ColumnBoundary::Floor);
        assert_eq!(floor[7], 7.0);
        assert_eq!(floor[..7], features[..7]);
    }

    #[test]
    fn test_lines_cleared_counts_full_rows() {
        let grid = Grid::from_ascii(
            "
            ...
            #..
            ###
            ###
            ",
        );
        let features = extract_features(&grid, FeatureSet::Minimal);
        assert_eq!(features[2], 2.0);
    }

    #[test]
    fn test_score_is_dot_product() {
        let features = [1.0, 5.0, 0.0, 8.0];
        let weights = [-2.0, -0.5, 3.0, 0.25];
        assert_eq!(score(&features, &weights).unwrap(), -2.0 - 2.5 + 0.0 + 2.0);
    }

    #[test]
    fn test_score_rejects_length_mismatch() {
        let err = score(&[1.0; 8], &[1.0; 4]).unwrap_err();
        assert_eq!(
            err,
            WeightError::LengthMismatch {
                weights: 4,
                features: 8
            }
        );
    }

    #[test]
    fn test_weight_vector_validation() {
        assert_eq!(
            WeightVector::new(vec![0.0; 4]).unwrap().feature_set(),
            FeatureSet::Minimal
        );
        assert_eq!(
            WeightVector::new(vec![0.0; 8]).unwrap().feature_set(),
            FeatureSet::Extended
        );
        for len in [0, 3, 5, 9] {
            assert_eq!(
                WeightVector::new(vec![0.0; len]).unwrap_err(),
                WeightError::UnsupportedLength { len }
            );
        }
        assert_eq!(
            WeightVector::new(vec![0.0, f32::NAN, 0.0, 0.0]).unwrap_err(),
            WeightError::NonFinite { index: 1 }
        );
    }

    #[test]
    fn test_weight_vector_json_round_trip() {
        let weights = WeightVector::new(vec![
            -4.123_456_7,
            -0.184_483,
            3.760_666,
            -0.510_066,
            -9.999_999,
            0.000_001_2,
            7.25,
            -1.0e-7,
        ])
        .unwrap();
        let json = serde_json::to_string(&weights).unwrap();
        assert!(json.starts_with('[') && json.ends_with(']'));
        let restored: WeightVector = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, weights);
        assert!(
            restored
                .iter()
                .zip(weights.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
        );
    }

    #[test]
    fn test_weight_vector_json_rejects_bad_length() {
        let err = serde_json::from_str::<WeightVector>("[1.0, 2.0, 3.0]").unwrap_err();
        assert!(err.to_string().contains("unsupported weight vector length 3"));
    }

    #[test]
    fn test_feature_set_parsing() {
        assert_eq!("minimal".parse::<FeatureSet>().unwrap(), FeatureSet::Minimal);
        assert_eq!("Extended".parse::<FeatureSet>().unwrap(), FeatureSet::Extended);
        assert_eq!("8".parse::<FeatureSet>().unwrap(), FeatureSet::Extended);
        assert!("medium".parse::<FeatureSet>().is_err());
        assert!(FeatureSet::from_len(6).is_err());
    }
}
