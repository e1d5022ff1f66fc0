//! Genetic optimization of placement weights.
//!
//! Training searches for the [`WeightVector`](blockfall_evaluator::board_feature::WeightVector)
//! that makes the greedy placement selector play the longest, most line-clearing games.
//!
//! # How Training Works
//!
//! 1. **Initialize** - create a population of random weight vectors
//! 2. **Evaluate** - each new individual plays the generation's seeded games in parallel
//! 3. **Select** - the fittest individuals survive unchanged; tournaments pick parents
//! 4. **Reproduce** - children are built by uniform crossover and per-gene mutation
//! 5. **Repeat** - until the generation budget runs out or the run is cancelled
//!
//! # Architecture
//!
//! ```text
//! Optimizer (configuration, generation loop, cancellation, reports)
//!     ↓ drives
//! Population / PopulationEvolver (evaluation, elitism, tournaments)
//!     ↓ uses
//! Weight operators (random, crossover, mutation)
//!     ↓ produce
//! Weight vectors, scored by blockfall-evaluator's session evaluator
//! ```
//!
//! - [`optimizer`] - [`TrainingConfig`](optimizer::TrainingConfig), the generation loop
//!   and per-generation [`GenerationReport`](optimizer::GenerationReport)s
//! - [`genetic`] - individuals, populations, and the evolution step
//! - [`weights`] - pure initialization, crossover and mutation operators
//! - [`stats`] - summary statistics used in reports
//! - [`model`] - trained model files
//!
//! # Example
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//!
//! use blockfall_engine::PieceCatalog;
//! use blockfall_training::optimizer::{Optimizer, TrainingConfig};
//! use rand::SeedableRng as _;
//!
//! let optimizer = Optimizer::new(TrainingConfig::default(), PieceCatalog::standard()).unwrap();
//! let mut rng = rand_pcg::Pcg32::seed_from_u64(0);
//! let outcome = optimizer
//!     .run(&mut rng, &AtomicBool::new(false), |report| {
//!         println!("generation {}: {:?}", report.generation, report.best.fitness());
//!     })
//!     .unwrap();
//! println!("{:?}", outcome.best);
//! ```

pub mod genetic;
pub mod model;
pub mod optimizer;
pub mod stats;
pub mod weights;
