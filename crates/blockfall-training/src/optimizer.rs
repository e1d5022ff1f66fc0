//! The generation loop tying population, evaluation and evolution together.
//!
//! A [`TrainingConfig`] is checked once by [`Optimizer::new`]; [`Optimizer::run`] then
//! plays the generations and reports each one to an observer callback.

use std::sync::atomic::{AtomicBool, Ordering};

use blockfall_engine::{PieceCatalog, PieceGeneration, PieceSeed, PlacementError};
use blockfall_evaluator::{
    board_analysis::ColumnBoundary,
    board_feature::FeatureSet,
    session_evaluator::{LinesSurvivalFitness, SessionEvaluator},
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    genetic::{FitnessEvaluation, Individual, Population, PopulationEvolver},
    stats::DescriptiveStats,
    weights::MutationKind,
};

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population size must be positive")]
    EmptyPopulation,
    #[display("elite count {elite_count} exceeds population size {population_size}")]
    TooManyElites {
        elite_count: usize,
        population_size: usize,
    },
    #[display("tournament size {tournament_size} must be in 1..={population_size}")]
    TournamentSize {
        tournament_size: usize,
        population_size: usize,
    },
    #[display("unsupported gene length {gene_length}, expected 4 or 8")]
    GeneLength { gene_length: usize },
    #[display("weight range [{min}, {max}] is empty")]
    WeightRange { min: f32, max: f32 },
    #[display("mutation rate {rate} is outside [0, 1]")]
    MutationRate { rate: f32 },
    #[display("mutation magnitude {magnitude} must be positive")]
    MutationMagnitude { magnitude: f32 },
    #[display("games per individual must be positive")]
    NoGames,
    #[display("step limit must be positive")]
    NoSteps,
    #[display("survival bonus {bonus} must be finite")]
    SurvivalBonus { bonus: f32 },
}

/// Parameters of a training run.
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    pub population_size: usize,
    pub generations: usize,
    pub elite_count: usize,
    pub tournament_size: usize,
    /// Per-coefficient mutation probability.
    pub mutation_rate: f32,
    pub mutation: MutationKind,
    pub weight_min: f32,
    pub weight_max: f32,
    /// 4 for the minimal feature set, 8 for the extended one.
    pub gene_length: usize,
    pub games_per_individual: usize,
    /// Pieces placed before a game is cut off.
    pub step_limit: usize,
    pub survival_bonus: f32,
    pub piece_generation: PieceGeneration,
    pub column_boundary: ColumnBoundary,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            generations: 30,
            elite_count: 3,
            tournament_size: 5,
            mutation_rate: 0.2,
            mutation: MutationKind::default(),
            weight_min: -10.0,
            weight_max: 10.0,
            gene_length: FeatureSet::Extended.len(),
            games_per_individual: 1,
            step_limit: 1000,
            survival_bonus: LinesSurvivalFitness::DEFAULT_SURVIVAL_BONUS,
            piece_generation: PieceGeneration::default(),
            column_boundary: ColumnBoundary::default(),
        }
    }
}

impl TrainingConfig {
    /// Checks every parameter and returns the feature set selected by `gene_length`.
    pub fn validate(&self) -> Result<FeatureSet, ConfigError> {
        let population_size = self.population_size;
        if population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.elite_count > population_size {
            return Err(ConfigError::TooManyElites {
                elite_count: self.elite_count,
                population_size,
            });
        }
        if !(1..=population_size).contains(&self.tournament_size) {
            return Err(ConfigError::TournamentSize {
                tournament_size: self.tournament_size,
                population_size,
            });
        }
        let feature_set =
            FeatureSet::from_len(self.gene_length).map_err(|_| ConfigError::GeneLength {
                gene_length: self.gene_length,
            })?;
        let (min, max) = (self.weight_min, self.weight_max);
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(ConfigError::WeightRange { min, max });
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::MutationRate {
                rate: self.mutation_rate,
            });
        }
        let magnitude = self.mutation.magnitude();
        if !(magnitude.is_finite() && magnitude > 0.0) {
            return Err(ConfigError::MutationMagnitude { magnitude });
        }
        if self.games_per_individual == 0 {
            return Err(ConfigError::NoGames);
        }
        if self.step_limit == 0 {
            return Err(ConfigError::NoSteps);
        }
        if !self.survival_bonus.is_finite() {
            return Err(ConfigError::SurvivalBonus {
                bonus: self.survival_bonus,
            });
        }
        Ok(feature_set)
    }

    fn evolver(&self) -> PopulationEvolver {
        PopulationEvolver {
            elite_count: self.elite_count,
            tournament_size: self.tournament_size,
            mutation_rate: self.mutation_rate,
            mutation: self.mutation,
        }
    }
}

/// State of the run after a generation has been evaluated.
#[derive(Debug)]
pub struct GenerationReport<'a> {
    /// Zero-based generation index.
    pub generation: usize,
    pub total_generations: usize,
    /// Evaluated population, best first.
    pub population: &'a Population,
    /// Piece sequences every fitness of the run was measured on.
    pub seeds: &'a [PieceSeed],
    pub best: &'a Individual,
    pub best_ever: &'a Individual,
    pub fitness_stats: DescriptiveStats,
    /// One entry per coefficient.
    pub weight_stats: Vec<DescriptiveStats>,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Best evaluated individual of the final population.
    pub best: Option<Individual>,
    pub best_ever: Option<Individual>,
    /// Best fitness of each completed generation.
    pub fitness_history: Vec<f32>,
    pub generations_completed: usize,
    pub cancelled: bool,
}

#[derive(Debug)]
pub struct Optimizer<'a> {
    config: TrainingConfig,
    feature_set: FeatureSet,
    catalog: &'a PieceCatalog,
}

impl<'a> Optimizer<'a> {
    pub fn new(config: TrainingConfig, catalog: &'a PieceCatalog) -> Result<Self, ConfigError> {
        let feature_set = config.validate()?;
        Ok(Self {
            config,
            feature_set,
            catalog,
        })
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    #[must_use]
    pub fn feature_set(&self) -> FeatureSet {
        self.feature_set
    }

    /// Runs the configured number of generations.
    ///
    /// `cancel` is checked before each generation; once set, the run stops and the outcome
    /// is marked cancelled. `observer` is called after every evaluated generation.
    ///
    /// Fails only if a placement chosen during evaluation is rejected by the game field.
    pub fn run<R, O>(
        &self,
        rng: &mut R,
        cancel: &AtomicBool,
        mut observer: O,
    ) -> Result<TrainingOutcome, PlacementError>
    where
        R: Rng + ?Sized,
        O: FnMut(&GenerationReport<'_>),
    {
        let config = &self.config;
        let session_evaluator = SessionEvaluator::new(
            self.catalog,
            config.piece_generation,
            config.step_limit,
            LinesSurvivalFitness::new(config.survival_bonus),
        );
        let evolver = config.evolver();

        let mut population = Population::random(
            config.population_size,
            rng,
            self.feature_set,
            config.weight_min..=config.weight_max,
        );
        // elites carry their fitness across generations, so every generation plays these
        let seeds = (0..config.games_per_individual)
            .map(|_| rng.random::<PieceSeed>())
            .collect::<Vec<_>>();
        let evaluation = FitnessEvaluation {
            session_evaluator: &session_evaluator,
            seeds: &seeds,
            column_boundary: config.column_boundary,
        };
        let mut best_ever: Option<Individual> = None;
        let mut fitness_history = Vec::with_capacity(config.generations);
        let mut cancelled = false;

        for generation in 0..config.generations {
            if cancel.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }
            if generation > 0 {
                population = evolver.evolve(&population, rng);
            }

            population.evaluate_fitness(&evaluation)?;

            let Some(best) = population.best() else {
                break;
            };
            if best_ever
                .as_ref()
                .is_none_or(|ever| best.fitness() > ever.fitness())
            {
                best_ever = Some(best.clone());
            }
            fitness_history.extend(best.fitness());

            if let (Some(fitness_stats), Some(best_ever)) =
                (population.fitness_stats(), best_ever.as_ref())
            {
                observer(&GenerationReport {
                    generation,
                    total_generations: config.generations,
                    population: &population,
                    seeds: &seeds,
                    best,
                    best_ever,
                    fitness_stats,
                    weight_stats: population.weight_stats(),
                });
            }
        }

        Ok(TrainingOutcome {
            best: population.best().cloned(),
            best_ever,
            generations_completed: fitness_history.len(),
            fitness_history,
            cancelled,
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn small_config() -> TrainingConfig {
        TrainingConfig {
            population_size: 6,
            generations: 4,
            elite_count: 1,
            tournament_size: 2,
            step_limit: 40,
            ..TrainingConfig::default()
        }
    }

    fn run(config: TrainingConfig, seed: u64) -> TrainingOutcome {
        let optimizer = Optimizer::new(config, PieceCatalog::standard()).unwrap();
        let mut rng = Pcg32::seed_from_u64(seed);
        optimizer
            .run(&mut rng, &AtomicBool::new(false), |_| {})
            .unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = TrainingConfig::default();
        assert_eq!(config.validate(), Ok(FeatureSet::Extended));
        assert_eq!(config.population_size, 30);
        assert_eq!(config.elite_count, 3);
        assert_eq!(config.tournament_size, 5);
        assert_eq!(config.mutation, MutationKind::Uniform { delta: 1.0 });
    }

    #[test]
    fn test_config_errors() {
        let cases: [(fn(&mut TrainingConfig), ConfigError); 10] = [
            (|c| c.population_size = 0, ConfigError::EmptyPopulation),
            (
                |c| c.elite_count = 31,
                ConfigError::TooManyElites {
                    elite_count: 31,
                    population_size: 30,
                },
            ),
            (
                |c| c.tournament_size = 0,
                ConfigError::TournamentSize {
                    tournament_size: 0,
                    population_size: 30,
                },
            ),
            (
                |c| c.tournament_size = 31,
                ConfigError::TournamentSize {
                    tournament_size: 31,
                    population_size: 30,
                },
            ),
            (|c| c.gene_length = 5, ConfigError::GeneLength { gene_length: 5 }),
            (
                |c| c.weight_min = 10.0,
                ConfigError::WeightRange {
                    min: 10.0,
                    max: 10.0,
                },
            ),
            (|c| c.mutation_rate = 1.5, ConfigError::MutationRate { rate: 1.5 }),
            (
                |c| c.mutation = MutationKind::Gaussian { sigma: 0.0 },
                ConfigError::MutationMagnitude { magnitude: 0.0 },
            ),
            (|c| c.games_per_individual = 0, ConfigError::NoGames),
            (|c| c.step_limit = 0, ConfigError::NoSteps),
        ];
        for (modify, expected) in cases {
            let mut config = TrainingConfig::default();
            modify(&mut config);
            assert_eq!(config.validate(), Err(expected.clone()));
            assert_eq!(
                Optimizer::new(config, PieceCatalog::standard()).unwrap_err(),
                expected
            );
        }
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: TrainingConfig = serde_json::from_str(
            r#"{"population_size": 12, "gene_length": 4, "mutation": {"kind": "gaussian", "sigma": 0.5}}"#,
        )
        .unwrap();
        assert_eq!(config.population_size, 12);
        assert_eq!(config.validate(), Ok(FeatureSet::Minimal));
        assert_eq!(config.generations, 30);
        assert!(serde_json::from_str::<TrainingConfig>(r#"{"populaton_size": 12}"#).is_err());
    }

    #[test]
    fn test_best_fitness_never_decreases() {
        let outcome = run(small_config(), 17);
        assert!(!outcome.cancelled);
        assert_eq!(outcome.generations_completed, 4);
        assert_eq!(outcome.fitness_history.len(), 4);
        assert!(outcome.fitness_history.is_sorted());

        let best = outcome.best.unwrap();
        let best_ever = outcome.best_ever.unwrap();
        assert_eq!(best.fitness(), outcome.fitness_history.last().copied());
        assert_eq!(best.fitness(), best_ever.fitness());
    }

    #[test]
    fn test_recorded_fitness_matches_ranking_sequences() {
        let config = TrainingConfig {
            games_per_individual: 2,
            ..small_config()
        };
        let catalog = PieceCatalog::standard();
        let session_evaluator = SessionEvaluator::new(
            catalog,
            config.piece_generation,
            config.step_limit,
            LinesSurvivalFitness::new(config.survival_bonus),
        );
        let optimizer = Optimizer::new(config, catalog).unwrap();
        let mut rng = Pcg32::seed_from_u64(23);

        let mut first_seeds = None;
        let mut checked = 0;
        optimizer
            .run(&mut rng, &AtomicBool::new(false), |report| {
                assert_eq!(report.seeds.len(), 2);
                let first_seeds = first_seeds.get_or_insert_with(|| report.seeds.to_vec());
                assert_eq!(first_seeds.as_slice(), report.seeds);

                let evaluation = FitnessEvaluation {
                    session_evaluator: &session_evaluator,
                    seeds: report.seeds,
                    column_boundary: ColumnBoundary::default(),
                };
                // includes the elite carried over from the previous generation
                for ind in report.population.individuals() {
                    let replayed = evaluation.evaluate(ind.weights()).unwrap();
                    assert_eq!(ind.fitness(), Some(replayed));
                    checked += 1;
                }
            })
            .unwrap();
        assert_eq!(checked, 6 * 4);
    }

    #[test]
    fn test_fixed_seed_reproduces_run() {
        let first = run(small_config(), 99);
        let second = run(small_config(), 99);
        assert_eq!(first.fitness_history, second.fitness_history);
        assert_eq!(first.best, second.best);
    }

    #[test]
    fn test_cancel_before_first_generation() {
        let optimizer = Optimizer::new(small_config(), PieceCatalog::standard()).unwrap();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut reports = 0;
        let outcome = optimizer
            .run(&mut rng, &AtomicBool::new(true), |_| reports += 1)
            .unwrap();
        assert!(outcome.cancelled);
        assert_eq!(reports, 0);
        assert_eq!(outcome.generations_completed, 0);
        assert!(outcome.best.is_none());
        assert!(outcome.best_ever.is_none());
    }

    #[test]
    fn test_cancel_during_run_keeps_best() {
        let optimizer = Optimizer::new(small_config(), PieceCatalog::standard()).unwrap();
        let mut rng = Pcg32::seed_from_u64(2);
        let cancel = AtomicBool::new(false);
        let outcome = optimizer
            .run(&mut rng, &cancel, |report| {
                assert_eq!(report.population.len(), 6);
                assert_eq!(report.weight_stats.len(), 8);
                if report.generation == 1 {
                    cancel.store(true, Ordering::Relaxed);
                }
            })
            .unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.generations_completed, 2);
        assert_eq!(
            outcome.best.unwrap().fitness(),
            outcome.best_ever.unwrap().fitness()
        );
    }
}
