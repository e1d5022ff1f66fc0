use std::path::{Path, PathBuf};

use blockfall_engine::{PieceCatalog, PieceSeed};
use blockfall_evaluator::{
    placement_evaluator::WeightedFeatureEvaluator,
    selector::{MovePolicy, PlacementSelector, RandomPolicy},
    session_evaluator::{FitnessFunction, LinesSurvivalFitness, SessionEvaluator},
};
use rand::Rng as _;
use serde::Serialize;

use crate::util::{self, PieceGenerationArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct BenchmarkArg {
    /// Weight files, or directories whose `.json` files are all benchmarked
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Games played per weights file
    #[arg(long, default_value_t = 5)]
    games: usize,
    /// Maximum pieces per game
    #[arg(long, default_value_t = 1000)]
    step_limit: usize,
    /// Number of entries in each ranking
    #[arg(long, default_value_t = 5)]
    top: usize,
    #[arg(long, value_enum, default_value_t)]
    piece_generation: PieceGenerationArg,
    /// Also benchmark a policy that picks legal landings at random
    #[arg(long)]
    random_baseline: bool,
    /// Random seed for the game sequences
    #[arg(long)]
    seed: Option<u64>,
    /// Write the results as JSON to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct BenchmarkResult {
    name: String,
    avg_lines: f32,
    avg_score: f32,
    avg_steps: f32,
    avg_fitness: f32,
}

pub(crate) fn run(arg: &BenchmarkArg) -> anyhow::Result<()> {
    let BenchmarkArg {
        paths,
        games,
        step_limit,
        top,
        piece_generation,
        random_baseline,
        seed,
        output,
    } = arg;

    let catalog = PieceCatalog::standard();
    let session_evaluator = SessionEvaluator::new(
        catalog,
        (*piece_generation).into(),
        *step_limit,
        LinesSurvivalFitness::default(),
    );
    let mut rng = util::seeded_rng(*seed);
    // every entry plays the same piece sequences
    let seeds = (0..*games)
        .map(|_| rng.random::<PieceSeed>())
        .collect::<Vec<_>>();

    eprintln!("Benchmarking saved weights over {games} games...");
    eprintln!();

    let mut results = vec![];
    for path in util::collect_json_files(paths)? {
        let weights = util::read_weights_file(&path)?;
        let mut selector =
            PlacementSelector::new(catalog, Box::new(WeightedFeatureEvaluator::new(weights)));
        let result = evaluate(&session_evaluator, &mut selector, &seeds, file_name(&path))?;
        print_result(&result);
        results.push(result);
    }
    if *random_baseline {
        let mut policy = RandomPolicy::new(catalog, util::seeded_rng(Some(rng.random())));
        let result = evaluate(&session_evaluator, &mut policy, &seeds, "(random)".to_owned())?;
        print_result(&result);
        results.push(result);
    }

    eprintln!();
    eprintln!("Top Performers by Lines Cleared:");
    results.sort_by(|a, b| b.avg_lines.total_cmp(&a.avg_lines));
    for result in results.iter().take(*top) {
        eprintln!("  {} -> {:.2} lines", result.name, result.avg_lines);
    }

    eprintln!();
    eprintln!("Top Performers by Score:");
    results.sort_by(|a, b| b.avg_score.total_cmp(&a.avg_score));
    for result in results.iter().take(*top) {
        eprintln!("  {} -> {:.2} score", result.name, result.avg_score);
    }

    if output.is_some() {
        util::save_json(&results, output.as_deref())?;
    }

    Ok(())
}

#[expect(clippy::cast_precision_loss)]
fn evaluate<F, P>(
    session_evaluator: &SessionEvaluator<'_, F>,
    policy: &mut P,
    seeds: &[PieceSeed],
    name: String,
) -> anyhow::Result<BenchmarkResult>
where
    F: FitnessFunction,
    P: MovePolicy + ?Sized,
{
    let fitness = session_evaluator.fitness();
    let (mut lines, mut score, mut steps, mut total_fitness) = (0, 0, 0, 0.0);
    for seed in seeds {
        let outcome = session_evaluator.play(policy, *seed)?;
        lines += outcome.lines_cleared();
        score += outcome.stats.score();
        steps += outcome.steps();
        total_fitness += fitness.fitness(&outcome);
    }
    let n = seeds.len().max(1) as f32;
    Ok(BenchmarkResult {
        name,
        avg_lines: lines as f32 / n,
        avg_score: score as f32 / n,
        avg_steps: steps as f32 / n,
        avg_fitness: total_fitness / n,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

fn print_result(result: &BenchmarkResult) {
    eprintln!(
        "{}: avg lines = {:.2}, avg score = {:.2}, avg steps = {:.1}",
        result.name, result.avg_lines, result.avg_score, result.avg_steps
    );
}
