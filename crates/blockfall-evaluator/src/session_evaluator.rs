//! Session evaluation: playing whole games and turning them into a fitness value.
//!
//! [`play_session`] runs one headless game with a [`MovePolicy`] until the policy finds
//! no legal landing or the step limit is reached. A [`FitnessFunction`] maps the
//! resulting [`SessionOutcome`] to a number, and [`SessionEvaluator`] averages that
//! number over several games started from given [`PieceSeed`]s.
//!
//! # Fitness
//!
//! [`LinesSurvivalFitness`] rewards cleared lines plus a bonus per placed piece:
//!
//! ```text
//! fitness = lines_cleared + survival_bonus × steps
//! ```
//!
//! A bonus of `0.0` scores line clears only.

use std::fmt;

use blockfall_engine::{
    GameField, GameStats, PieceCatalog, PieceGeneration, PieceSeed, PlacementError,
};
use serde::{Deserialize, Serialize};

use crate::selector::MovePolicy;

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(rename_all = "kebab-case")]
pub enum SessionEnd {
    /// The policy found no legal landing for the current piece.
    NoPlacement,
    /// The step limit was reached.
    StepLimit,
}

#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub stats: GameStats,
    pub end: SessionEnd,
}

impl SessionOutcome {
    /// Number of pieces placed.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.stats.completed_pieces()
    }

    #[must_use]
    pub fn lines_cleared(&self) -> usize {
        self.stats.total_cleared_lines()
    }
}

/// Plays on `field` until no landing is left or `step_limit` pieces were placed.
///
/// Fails only if `policy` returns a landing the field rejects.
pub fn play_session<P>(
    field: &mut GameField,
    catalog: &PieceCatalog,
    policy: &mut P,
    step_limit: usize,
) -> Result<SessionOutcome, PlacementError>
where
    P: MovePolicy + ?Sized,
{
    let mut stats = GameStats::new();
    for _ in 0..step_limit {
        let Some(landing) = policy.choose(field.current_kind(), field.grid()) else {
            return Ok(SessionOutcome {
                stats,
                end: SessionEnd::NoPlacement,
            });
        };
        let cleared_lines = field.apply_placement(catalog, landing.placement)?;
        stats.complete_piece_drop(cleared_lines);
    }
    Ok(SessionOutcome {
        stats,
        end: SessionEnd::StepLimit,
    })
}

/// Maps a finished session to a fitness value (higher is better).
pub trait FitnessFunction: fmt::Debug + Send + Sync {
    fn fitness(&self, outcome: &SessionOutcome) -> f32;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinesSurvivalFitness {
    pub survival_bonus: f32,
}

impl LinesSurvivalFitness {
    pub const DEFAULT_SURVIVAL_BONUS: f32 = 0.1;

    #[must_use]
    pub const fn new(survival_bonus: f32) -> Self {
        Self { survival_bonus }
    }
}

impl Default for LinesSurvivalFitness {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SURVIVAL_BONUS)
    }
}

impl FitnessFunction for LinesSurvivalFitness {
    #[expect(clippy::cast_precision_loss)]
    fn fitness(&self, outcome: &SessionOutcome) -> f32 {
        outcome.lines_cleared() as f32 + self.survival_bonus * outcome.steps() as f32
    }
}

/// Plays games with fresh fields and averages their fitness.
#[derive(Debug)]
pub struct SessionEvaluator<'a, F> {
    catalog: &'a PieceCatalog,
    generation: PieceGeneration,
    step_limit: usize,
    fitness: F,
}

impl<'a, F> SessionEvaluator<'a, F>
where
    F: FitnessFunction,
{
    #[must_use]
    pub fn new(
        catalog: &'a PieceCatalog,
        generation: PieceGeneration,
        step_limit: usize,
        fitness: F,
    ) -> Self {
        Self {
            catalog,
            generation,
            step_limit,
            fitness,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &'a PieceCatalog {
        self.catalog
    }

    /// The fitness function [`evaluate`](Self::evaluate) averages.
    #[must_use]
    pub fn fitness(&self) -> &F {
        &self.fitness
    }

    /// Plays one game per seed with `policy` and returns the mean fitness.
    ///
    /// Returns `0.0` for an empty seed list.
    #[expect(clippy::cast_precision_loss)]
    pub fn evaluate<P>(&self, policy: &mut P, seeds: &[PieceSeed]) -> Result<f32, PlacementError>
    where
        P: MovePolicy + ?Sized,
    {
        if seeds.is_empty() {
            return Ok(0.0);
        }
        let mut total_fitness = 0.0;
        for seed in seeds {
            let outcome = self.play(policy, *seed)?;
            total_fitness += self.fitness.fitness(&outcome);
        }
        Ok(total_fitness / seeds.len() as f32)
    }

    /// Plays a single game starting from `seed`.
    pub fn play<P>(&self, policy: &mut P, seed: PieceSeed) -> Result<SessionOutcome, PlacementError>
    where
        P: MovePolicy + ?Sized,
    {
        let mut field = GameField::new(self.generation, seed);
        play_session(&mut field, self.catalog, policy, self.step_limit)
    }
}

#[cfg(test)]
mod tests {
    use blockfall_engine::{Grid, Landing, PieceBuffer, PieceKind, Placement};
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::{
        board_feature::WeightVector,
        placement_evaluator::WeightedFeatureEvaluator,
        selector::{PlacementSelector, RandomPolicy},
    };

    const SEED: PieceSeed = PieceSeed::from_bytes([42; 16]);

    fn selector(catalog: &PieceCatalog) -> PlacementSelector<'_> {
        let weights =
            WeightVector::new(vec![-7.9, -1.8, 3.4, -0.5, -0.3, -0.8, -0.9, -2.1]).unwrap();
        PlacementSelector::new(catalog, Box::new(WeightedFeatureEvaluator::new(weights)))
    }

    #[derive(Debug)]
    struct Stubborn;

    impl MovePolicy for Stubborn {
        fn choose(&mut self, kind: PieceKind, _grid: &Grid) -> Option<Landing> {
            Some(Landing {
                kind,
                placement: Placement::new(0, -10),
                row: 0,
            })
        }
    }

    #[test]
    fn test_step_limit_ends_session() {
        let catalog = PieceCatalog::standard();
        let mut field = GameField::new(PieceGeneration::SevenBag, SEED);
        let outcome = play_session(&mut field, catalog, &mut selector(catalog), 15).unwrap();
        assert_eq!(outcome.end, SessionEnd::StepLimit);
        assert_eq!(outcome.steps(), 15);
    }

    #[test]
    fn test_zero_step_limit() {
        let catalog = PieceCatalog::standard();
        let mut field = GameField::new(PieceGeneration::SevenBag, SEED);
        let outcome = play_session(&mut field, catalog, &mut selector(catalog), 0).unwrap();
        assert!(outcome.end.is_step_limit());
        assert_eq!(outcome.steps(), 0);
    }

    #[test]
    fn test_no_placement_ends_session() {
        let catalog = PieceCatalog::standard();
        let grid = Grid::from_ascii(
            "
            ##########
            ##########
            ",
        );
        let buffer = PieceBuffer::with_seed(PieceGeneration::Uniform, SEED);
        let mut field = GameField::with_grid(grid, buffer);
        let outcome = play_session(&mut field, catalog, &mut selector(catalog), 100).unwrap();
        assert!(outcome.end.is_no_placement());
        assert_eq!(outcome.steps(), 0);
    }

    #[test]
    fn test_random_policy_session() {
        let catalog = PieceCatalog::standard();
        let mut field = GameField::new(PieceGeneration::SevenBag, SEED);
        let mut policy = RandomPolicy::new(catalog, Pcg32::seed_from_u64(1));
        let outcome = play_session(&mut field, catalog, &mut policy, 200).unwrap();
        assert!(outcome.steps() > 0);
        assert_eq!(outcome.end.is_step_limit(), outcome.steps() == 200);
    }

    #[test]
    fn test_rejected_landing_is_an_error() {
        let catalog = PieceCatalog::standard();
        let mut field = GameField::new(PieceGeneration::SevenBag, SEED);
        let err = play_session(&mut field, catalog, &mut Stubborn, 10).unwrap_err();
        assert!(matches!(err, PlacementError::NoLanding { x: -10, .. }));
    }

    #[test]
    fn test_lines_survival_fitness() {
        let mut stats = GameStats::new();
        for lines in [0, 1, 0, 2] {
            stats.complete_piece_drop(lines);
        }
        let outcome = SessionOutcome {
            stats,
            end: SessionEnd::NoPlacement,
        };
        assert!((LinesSurvivalFitness::default().fitness(&outcome) - 3.4).abs() < 1e-6);
        assert_eq!(LinesSurvivalFitness::new(0.0).fitness(&outcome), 3.0);
    }

    #[test]
    fn test_evaluate_is_reproducible_and_averaged() {
        let catalog = PieceCatalog::standard();
        let evaluator = SessionEvaluator::new(
            catalog,
            PieceGeneration::SevenBag,
            50,
            LinesSurvivalFitness::default(),
        );
        let seeds = [SEED, PieceSeed::from_bytes([9; 16])];

        let first = evaluator.evaluate(&mut selector(catalog), &seeds).unwrap();
        let second = evaluator.evaluate(&mut selector(catalog), &seeds).unwrap();
        assert_eq!(first, second);

        let fitness = LinesSurvivalFitness::default();
        let expected = seeds
            .iter()
            .map(|seed| {
                let outcome = evaluator.play(&mut selector(catalog), *seed).unwrap();
                fitness.fitness(&outcome)
            })
            .sum::<f32>()
            / 2.0;
        assert!((first - expected).abs() < 1e-4);
        assert_eq!(evaluator.evaluate(&mut selector(catalog), &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_evaluate_averages_configured_fitness() {
        let catalog = PieceCatalog::standard();
        let evaluator = SessionEvaluator::new(
            catalog,
            PieceGeneration::SevenBag,
            20,
            LinesSurvivalFitness::new(0.5),
        );
        assert_eq!(evaluator.fitness(), &LinesSurvivalFitness::new(0.5));

        let outcome = evaluator.play(&mut selector(catalog), SEED).unwrap();
        let mean = evaluator
            .evaluate(&mut selector(catalog), &[SEED])
            .unwrap();
        assert_eq!(mean, evaluator.fitness().fitness(&outcome));
        assert!(mean >= 0.5 * 20.0);
    }
}
