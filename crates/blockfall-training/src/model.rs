//! Trained weight files.
//!
//! A weights file is either a bare JSON array of coefficients or a [`TrainedModel`]
//! object carrying the coefficients together with how they were obtained. [`WeightsFile`]
//! reads both.

use blockfall_evaluator::board_feature::{FeatureSet, WeightVector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::optimizer::TrainingOutcome;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("model declares the {declared} feature set but has {actual_len} weights")]
pub struct FeatureSetMismatch {
    pub declared: FeatureSet,
    pub actual_len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub feature_set: FeatureSet,
    pub final_fitness: f32,
    /// Best fitness of each generation.
    pub fitness_history: Vec<f32>,
    pub weights: WeightVector,
}

impl TrainedModel {
    /// Builds a model from the best individual of a run.
    ///
    /// Returns `None` if the run evaluated nothing.
    #[must_use]
    pub fn from_outcome(
        name: impl Into<String>,
        trained_at: DateTime<Utc>,
        outcome: &TrainingOutcome,
    ) -> Option<Self> {
        let best = outcome.best.as_ref().or(outcome.best_ever.as_ref())?;
        Some(Self {
            name: name.into(),
            trained_at,
            feature_set: best.weights().feature_set(),
            final_fitness: best.fitness()?,
            fitness_history: outcome.fitness_history.clone(),
            weights: best.weights().clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightsFile {
    Model(TrainedModel),
    Bare(WeightVector),
}

impl WeightsFile {
    /// Returns the coefficients, checking a model's declared feature set against them.
    pub fn into_weights(self) -> Result<WeightVector, FeatureSetMismatch> {
        match self {
            Self::Bare(weights) => Ok(weights),
            Self::Model(model) => {
                if model.weights.feature_set() == model.feature_set {
                    Ok(model.weights)
                } else {
                    Err(FeatureSetMismatch {
                        declared: model.feature_set,
                        actual_len: model.weights.as_slice().len(),
                    })
                }
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Model(model) => Some(&model.name),
            Self::Bare(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;
    use crate::genetic::Individual;

    const WEIGHTS: [f32; 8] = [-7.9123, -1.8, 3.4, -0.5, 0.1, -0.8136, -0.9, -2.1234];

    fn model() -> TrainedModel {
        TrainedModel {
            name: "best_weights_1700000000".to_owned(),
            trained_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            feature_set: FeatureSet::Extended,
            final_fitness: 42.5,
            fitness_history: vec![10.0, 30.25, 42.5],
            weights: WeightVector::new(WEIGHTS.to_vec()).unwrap(),
        }
    }

    #[test]
    fn test_model_round_trip() {
        let json = serde_json::to_string_pretty(&model()).unwrap();
        let parsed: WeightsFile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, WeightsFile::Model(model()));
        assert_eq!(parsed.name(), Some("best_weights_1700000000"));
        assert_eq!(parsed.into_weights().unwrap().as_slice(), &WEIGHTS);
    }

    #[test]
    fn test_bare_array() {
        let parsed: WeightsFile = serde_json::from_str("[-4.0, -0.2, 3.0, -0.5]").unwrap();
        assert_eq!(parsed.name(), None);
        let weights = parsed.into_weights().unwrap();
        assert_eq!(weights.feature_set(), FeatureSet::Minimal);
    }

    #[test]
    fn test_rejects_bad_files() {
        assert!(serde_json::from_str::<WeightsFile>("[1.0, 2.0, 3.0]").is_err());
        assert!(serde_json::from_str::<WeightsFile>(r#"{"name": "x"}"#).is_err());

        let mut model = model();
        model.feature_set = FeatureSet::Minimal;
        let err = WeightsFile::Model(model).into_weights().unwrap_err();
        assert_eq!(
            err,
            FeatureSetMismatch {
                declared: FeatureSet::Minimal,
                actual_len: 8,
            }
        );
    }

    #[test]
    fn test_from_outcome() {
        let empty = TrainingOutcome {
            best: None,
            best_ever: None,
            fitness_history: vec![],
            generations_completed: 0,
            cancelled: true,
        };
        let now = Utc::now();
        assert!(TrainedModel::from_outcome("empty", now, &empty).is_none());

        let individual: Individual = serde_json::from_value(serde_json::json!({
            "weights": [-4.0, -0.2, 3.0, -0.5],
            "fitness": 7.5,
        }))
        .unwrap();
        let outcome = TrainingOutcome {
            best: Some(individual.clone()),
            best_ever: Some(individual),
            fitness_history: vec![3.0, 7.5],
            generations_completed: 2,
            cancelled: false,
        };
        let model = TrainedModel::from_outcome("run", now, &outcome).unwrap();
        assert_eq!(model.feature_set, FeatureSet::Minimal);
        assert_eq!(model.final_fitness, 7.5);
        assert_eq!(model.fitness_history, [3.0, 7.5]);
    }
}
