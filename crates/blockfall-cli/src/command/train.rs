use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::Context;
use blockfall_engine::PieceCatalog;
use blockfall_evaluator::board_feature::FeatureSet;
use blockfall_training::{
    model::TrainedModel,
    optimizer::{GenerationReport, Optimizer, TrainingConfig},
    stats::DescriptiveStats,
};
use chrono::Utc;

use crate::util::{self, PieceGenerationArg};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Training configuration file (JSON); missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    population_size: Option<usize>,
    #[arg(long)]
    generations: Option<usize>,
    #[arg(long)]
    elite_count: Option<usize>,
    #[arg(long)]
    tournament_size: Option<usize>,
    /// Per-gene mutation probability
    #[arg(long)]
    mutation_rate: Option<f32>,
    /// Feature set to train: minimal (4 genes) or extended (8 genes)
    #[arg(long)]
    features: Option<FeatureSet>,
    #[arg(long)]
    games_per_individual: Option<usize>,
    /// Maximum pieces per game
    #[arg(long)]
    step_limit: Option<usize>,
    /// Fitness bonus per placed piece
    #[arg(long)]
    survival_bonus: Option<f32>,
    #[arg(long, value_enum)]
    piece_generation: Option<PieceGenerationArg>,
    /// Random seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
    /// Model name (defaults to `best_weights_<unix time>`)
    #[arg(long)]
    name: Option<String>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

impl TrainArg {
    fn load_config(&self) -> anyhow::Result<TrainingConfig> {
        let mut config: TrainingConfig = match &self.config {
            Some(path) => util::read_json_file("training config", path)?,
            None => TrainingConfig::default(),
        };
        let overrides = [
            (self.population_size, &mut config.population_size),
            (self.generations, &mut config.generations),
            (self.elite_count, &mut config.elite_count),
            (self.tournament_size, &mut config.tournament_size),
            (self.games_per_individual, &mut config.games_per_individual),
            (self.step_limit, &mut config.step_limit),
        ];
        for (value, field) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(rate) = self.mutation_rate {
            config.mutation_rate = rate;
        }
        if let Some(bonus) = self.survival_bonus {
            config.survival_bonus = bonus;
        }
        if let Some(features) = self.features {
            config.gene_length = features.len();
        }
        if let Some(generation) = self.piece_generation {
            config.piece_generation = generation.into();
        }
        Ok(config)
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let config = arg.load_config()?;
    let optimizer = Optimizer::new(config, PieceCatalog::standard())
        .context("Invalid training configuration")?;

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_requested = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        eprintln!("\nCtrl+C received, stopping after the current generation...");
        cancel_requested.store(true, Ordering::Relaxed);
    })
    .context("Failed to set Ctrl+C handler")?;

    eprintln!(
        "Training {} features, {} individuals, {} generations",
        optimizer.feature_set(),
        optimizer.config().population_size,
        optimizer.config().generations,
    );

    let trained_at = Utc::now();
    let mut rng = util::seeded_rng(arg.seed);
    let outcome = optimizer.run(&mut rng, &cancel, print_report)?;

    if outcome.cancelled {
        eprintln!(
            "Training cancelled after {} generations.",
            outcome.generations_completed
        );
    } else {
        eprintln!("Training completed.");
    }

    let name = arg
        .name
        .clone()
        .unwrap_or_else(|| format!("best_weights_{}", trained_at.timestamp()));
    let model = TrainedModel::from_outcome(name, trained_at, &outcome)
        .context("No generation was evaluated; nothing to save")?;
    util::save_json(&model, arg.output.as_deref())?;

    eprintln!();
    eprintln!("Model saved successfully");
    if let Some(path) = &arg.output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Name: {}", model.name);
    eprintln!("  Trained at: {}", model.trained_at);
    eprintln!("  Final fitness: {:.3}", model.final_fitness);
    eprintln!("  Weights: {}", model.weights);

    Ok(())
}

fn print_report(report: &GenerationReport<'_>) {
    let GenerationReport {
        generation,
        total_generations,
        population,
        seeds: _,
        best,
        best_ever,
        fitness_stats,
        weight_stats,
    } = report;

    eprintln!("Generation #{generation} / {total_generations}:");
    eprintln!("  Individuals:");
    for (i, ind) in population.individuals().iter().enumerate() {
        let fitness = ind.fitness().unwrap_or(f32::NAN);
        eprintln!("  {i:2}: {} => {fitness:.3}", ind.weights());
    }

    let column = |f: fn(&DescriptiveStats) -> f32| weight_stats.iter().map(f).collect::<Vec<_>>();
    eprintln!("  Weights Stats:");
    eprintln!("    Min:    {:.3?}", column(|s| s.min));
    eprintln!("    Max:    {:.3?}", column(|s| s.max));
    eprintln!("    Mean:   {:.3?}", column(|s| s.mean));
    eprintln!("    Spread: {:.3?}", column(|s| s.spread));

    eprintln!("  Fitness Stats:");
    eprintln!("    Min:  {:.3}", fitness_stats.min);
    eprintln!("    Max:  {:.3}", fitness_stats.max);
    eprintln!("    Mean: {:.3}", fitness_stats.mean);
    eprintln!(
        "  Best: {:.3} (best ever {:.3})",
        best.fitness().unwrap_or(f32::NAN),
        best_ever.fitness().unwrap_or(f32::NAN),
    );
}
