use std::path::PathBuf;

use blockfall_engine::{GameField, Grid, Landing, PieceCatalog, PieceKind};
use blockfall_evaluator::{
    placement_evaluator::WeightedFeatureEvaluator,
    selector::{MovePolicy, PlacementSelector, RandomPolicy},
    session_evaluator,
};
use rand::Rng as _;

use crate::util::{self, PieceGenerationArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AutoPlayArg {
    /// Weights file (bare array or trained model); plays randomly when omitted
    weights_path: Option<PathBuf>,
    /// Maximum pieces to place
    #[arg(long, default_value_t = 1000)]
    step_limit: usize,
    /// Print the board every N pieces (0 prints only the final board)
    #[arg(long, default_value_t = 0)]
    show_every: usize,
    #[arg(long, value_enum, default_value_t)]
    piece_generation: PieceGenerationArg,
    /// Random seed for the piece sequence
    #[arg(long)]
    seed: Option<u64>,
}

pub(crate) fn run(arg: &AutoPlayArg) -> anyhow::Result<()> {
    let AutoPlayArg {
        weights_path,
        step_limit,
        show_every,
        piece_generation,
        seed,
    } = arg;

    let catalog = PieceCatalog::standard();
    let mut rng = util::seeded_rng(*seed);
    let mut policy: Box<dyn MovePolicy> = match weights_path {
        Some(path) => {
            let weights = util::read_weights_file(path)?;
            eprintln!("Playing with weights {weights}");
            Box::new(PlacementSelector::new(
                catalog,
                Box::new(WeightedFeatureEvaluator::new(weights)),
            ))
        }
        None => {
            eprintln!("Playing with random placements");
            Box::new(RandomPolicy::new(catalog, util::seeded_rng(Some(rng.random()))))
        }
    };

    let mut field = GameField::new((*piece_generation).into(), rng.random());
    let mut policy = ShowEvery::new(policy.as_mut(), *show_every);
    let outcome = session_evaluator::play_session(&mut field, catalog, &mut policy, *step_limit)?;
    let stats = &outcome.stats;

    println!("{}", field.grid());
    println!("Game ended: {:?}", outcome.end);
    println!("  Pieces: {}", stats.completed_pieces());
    println!("  Lines:  {}", stats.total_cleared_lines());
    println!("  Score:  {}", stats.score());
    println!("  Level:  {}", stats.level());
    println!("  Clears: {:?}", stats.line_cleared_counter());

    Ok(())
}

/// Prints the board every `interval` placed pieces before delegating to `policy`.
struct ShowEvery<'a> {
    policy: &'a mut dyn MovePolicy,
    interval: usize,
    placed: usize,
}

impl<'a> ShowEvery<'a> {
    fn new(policy: &'a mut dyn MovePolicy, interval: usize) -> Self {
        Self {
            policy,
            interval,
            placed: 0,
        }
    }
}

impl MovePolicy for ShowEvery<'_> {
    fn choose(&mut self, kind: PieceKind, grid: &Grid) -> Option<Landing> {
        if self.interval > 0 && self.placed > 0 && self.placed % self.interval == 0 {
            println!("After {} pieces:", self.placed);
            println!("{grid}");
        }
        let landing = self.policy.choose(kind, grid)?;
        self.placed += 1;
        Some(landing)
    }
}
