//! Weight vector operators for the genetic algorithm.
//!
//! Every operator is a pure function: parents are borrowed and a new
//! [`WeightVector`] is returned. Randomness always comes from the caller's generator.
//!
//! - **Initialization**: [`random`] draws each coefficient uniformly from a range
//! - **Crossover**: [`uniform_crossover`] takes each coefficient from either parent with
//!   equal probability
//! - **Mutation**: [`mutate`] perturbs each coefficient with a given probability, either
//!   uniformly within `±delta` or with Gaussian noise

use std::ops::RangeInclusive;

use blockfall_evaluator::board_feature::{FeatureSet, WeightVector};
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

/// How a selected coefficient is perturbed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MutationKind {
    /// Adds a value drawn uniformly from `[-delta, delta]`.
    Uniform { delta: f32 },
    /// Adds a value drawn from `N(0, sigma)`.
    Gaussian { sigma: f32 },
}

impl Default for MutationKind {
    fn default() -> Self {
        Self::Uniform { delta: 1.0 }
    }
}

impl MutationKind {
    /// The `delta` or `sigma` of the perturbation.
    #[must_use]
    pub fn magnitude(self) -> f32 {
        match self {
            Self::Uniform { delta } => delta,
            Self::Gaussian { sigma } => sigma,
        }
    }
}

/// Draws a vector for `feature_set` with every coefficient uniform in `range`.
pub fn random<R>(rng: &mut R, feature_set: FeatureSet, range: RangeInclusive<f32>) -> WeightVector
where
    R: Rng + ?Sized,
{
    WeightVector::from_fn(feature_set, |_| rng.random_range(range.clone()))
}

/// Builds a child taking each coefficient from `p1` or `p2` with equal probability.
///
/// # Panics
///
/// Panics if the parents have different lengths.
pub fn uniform_crossover<R>(p1: &WeightVector, p2: &WeightVector, rng: &mut R) -> WeightVector
where
    R: Rng + ?Sized,
{
    let p2 = p2.as_slice();
    assert_eq!(p1.as_slice().len(), p2.len(), "parents differ in length");
    p1.map(|i, g1| if rng.random_bool(0.5) { g1 } else { p2[i] })
}

/// Returns a copy of `weights` where each coefficient is perturbed with probability `rate`.
///
/// # Panics
///
/// Panics if `rate` is outside `[0, 1]`, or if the `delta` or `sigma` of `kind` is negative
/// or not finite.
pub fn mutate<R>(weights: &WeightVector, kind: MutationKind, rate: f32, rng: &mut R) -> WeightVector
where
    R: Rng + ?Sized,
{
    let magnitude = kind.magnitude();
    assert!(
        magnitude.is_finite() && magnitude >= 0.0,
        "invalid mutation magnitude: {magnitude}"
    );
    let rate = f64::from(rate);
    let noise: Box<dyn Fn(&mut R) -> f32> = match kind {
        MutationKind::Uniform { delta } => {
            let dist =
                Uniform::new_inclusive(-delta, delta).expect("delta is finite and non-negative");
            Box::new(move |rng: &mut R| dist.sample(rng))
        }
        MutationKind::Gaussian { sigma } => {
            let dist = Normal::new(0.0, sigma).expect("sigma is finite and non-negative");
            Box::new(move |rng: &mut R| dist.sample(rng))
        }
    };
    weights.map(|_, gene| {
        if rng.random_bool(rate) {
            gene + noise(rng)
        } else {
            gene
        }
    })
}
