//! Population, selection and reproduction for evolving weight vectors.
//!
//! # Generation Cycle
//!
//! 1. **Evaluate** - every individual without a fitness plays the same set of seeded games
//!    with a greedy [`PlacementSelector`] and receives their mean fitness
//! 2. **Rank** - individuals are sorted by fitness, best first
//! 3. **Elitism** - the top `elite_count` individuals are copied into the next generation
//!    together with their fitness, so they are not played again
//! 4. **Reproduction** - the rest of the next generation is filled with children of two
//!    tournament winners, built by [`uniform_crossover`](weights::uniform_crossover) and
//!    [`mutate`](weights::mutate)
//!
//! Because elites carry their fitness forward, the best fitness of a population can never
//! drop from one generation to the next.
//!
//! # Parallelization
//!
//! Fitness evaluation spawns one scoped thread per unevaluated individual. Each thread
//! builds its own selector, so threads share nothing but the read-only catalog and seeds.

use std::{cmp::Ordering, ops::RangeInclusive, panic, thread};

use blockfall_engine::{PieceSeed, PlacementError};
use blockfall_evaluator::{
    board_analysis::ColumnBoundary,
    board_feature::{FeatureSet, WeightVector},
    placement_evaluator::WeightedFeatureEvaluator,
    selector::PlacementSelector,
    session_evaluator::{FitnessFunction, SessionEvaluator},
};
use rand::{Rng, seq::IndexedRandom as _};
use serde::{Deserialize, Serialize};

use crate::{
    stats::DescriptiveStats,
    weights::{self, MutationKind},
};

/// A weight vector and, once it has played, its fitness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    weights: WeightVector,
    fitness: Option<f32>,
}

impl Individual {
    #[must_use]
    pub fn new(weights: WeightVector) -> Self {
        Self {
            weights,
            fitness: None,
        }
    }

    pub fn random<R>(rng: &mut R, feature_set: FeatureSet, range: RangeInclusive<f32>) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::new(weights::random(rng, feature_set, range))
    }

    #[must_use]
    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    /// Mean fitness over the evaluation games, `None` until evaluated.
    #[must_use]
    pub fn fitness(&self) -> Option<f32> {
        self.fitness
    }

    fn rank_key(&self) -> f32 {
        self.fitness.unwrap_or(f32::NEG_INFINITY)
    }
}

/// Orders individuals by fitness with unevaluated ones lowest.
fn compare_fitness(a: &Individual, b: &Individual) -> Ordering {
    a.rank_key().total_cmp(&b.rank_key())
}

/// Everything an individual needs to play its evaluation games.
#[derive(Debug)]
pub struct FitnessEvaluation<'a, F> {
    pub session_evaluator: &'a SessionEvaluator<'a, F>,
    pub seeds: &'a [PieceSeed],
    pub column_boundary: ColumnBoundary,
}

impl<F> FitnessEvaluation<'_, F>
where
    F: FitnessFunction,
{
    /// Plays every seeded game with a greedy selector using `weights`.
    pub fn evaluate(&self, weights: &WeightVector) -> Result<f32, PlacementError> {
        let evaluator =
            WeightedFeatureEvaluator::with_column_boundary(weights.clone(), self.column_boundary);
        let mut selector =
            PlacementSelector::new(self.session_evaluator.catalog(), Box::new(evaluator));
        self.session_evaluator.evaluate(&mut selector, self.seeds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    #[must_use]
    pub fn new(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    /// Creates `count` individuals with coefficients uniform in `range`.
    pub fn random<R>(
        count: usize,
        rng: &mut R,
        feature_set: FeatureSet,
        range: RangeInclusive<f32>,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        let individuals = (0..count)
            .map(|_| Individual::random(rng, feature_set, range.clone()))
            .collect();
        Self { individuals }
    }

    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Evaluates every individual without a fitness in parallel, then sorts best first.
    ///
    /// Individuals that already carry a fitness keep it. The sort is stable, so equally
    /// fit individuals keep their relative order.
    pub fn evaluate_fitness<F>(
        &mut self,
        evaluation: &FitnessEvaluation<'_, F>,
    ) -> Result<(), PlacementError>
    where
        F: FitnessFunction,
    {
        thread::scope(|s| {
            let handles = self
                .individuals
                .iter_mut()
                .filter(|ind| ind.fitness.is_none())
                .map(|ind| {
                    s.spawn(move || -> Result<(), PlacementError> {
                        ind.fitness = Some(evaluation.evaluate(&ind.weights)?);
                        Ok(())
                    })
                })
                .collect::<Vec<_>>();
            handles.into_iter().try_for_each(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| panic::resume_unwind(payload))
            })
        })?;

        self.individuals.sort_by(|a, b| compare_fitness(b, a));
        Ok(())
    }

    /// The fittest evaluated individual; the earliest one wins ties.
    #[must_use]
    pub fn best(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .filter(|ind| ind.fitness.is_some())
            .reduce(|best, ind| {
                if compare_fitness(ind, best).is_gt() {
                    ind
                } else {
                    best
                }
            })
    }

    /// Statistics of each coefficient across the population.
    #[must_use]
    pub fn weight_stats(&self) -> Vec<DescriptiveStats> {
        let Some(first) = self.individuals.first() else {
            return vec![];
        };
        (0..first.weights.as_slice().len())
            .filter_map(|i| {
                DescriptiveStats::new(self.individuals.iter().map(|ind| ind.weights.as_slice()[i]))
            })
            .collect()
    }

    /// Statistics of the evaluated fitness values, `None` if nobody was evaluated.
    #[must_use]
    pub fn fitness_stats(&self) -> Option<DescriptiveStats> {
        DescriptiveStats::new(self.individuals.iter().filter_map(Individual::fitness))
    }
}

/// Builds the next generation from an evaluated population.
#[derive(Debug, Clone, Copy)]
pub struct PopulationEvolver {
    pub elite_count: usize,
    /// Individuals drawn (without replacement) per tournament.
    pub tournament_size: usize,
    /// Per-coefficient mutation probability.
    pub mutation_rate: f32,
    pub mutation: MutationKind,
}

impl PopulationEvolver {
    /// Returns a population of the same size as `population`.
    ///
    /// `population` must be sorted best first, as left by
    /// [`Population::evaluate_fitness`].
    ///
    /// # Panics
    ///
    /// Panics if `population` is not sorted, or if children are needed and
    /// `tournament_size` is zero.
    #[must_use]
    pub fn evolve<R>(&self, population: &Population, rng: &mut R) -> Population
    where
        R: Rng + ?Sized,
    {
        let individuals = &population.individuals;
        assert!(
            individuals.is_sorted_by(|a, b| compare_fitness(a, b).is_ge()),
            "population must be sorted by fitness"
        );

        let mut next = Vec::with_capacity(individuals.len());
        next.extend(individuals.iter().take(self.elite_count).cloned());

        while next.len() < individuals.len() {
            let p1 = tournament_select(individuals, self.tournament_size, rng);
            let p2 = tournament_select(individuals, self.tournament_size, rng);
            let child = weights::uniform_crossover(&p1.weights, &p2.weights, rng);
            let child = weights::mutate(&child, self.mutation, self.mutation_rate, rng);
            next.push(Individual::new(child));
        }

        Population { individuals: next }
    }
}

/// Draws `tournament_size` distinct individuals and returns the fittest.
fn tournament_select<'a, R>(
    population: &'a [Individual],
    tournament_size: usize,
    rng: &mut R,
) -> &'a Individual
where
    R: Rng + ?Sized,
{
    assert!(tournament_size > 0);
    population
        .choose_multiple(rng, tournament_size)
        .max_by(|a, b| compare_fitness(a, b))
        .expect("tournament must not be empty")
}
