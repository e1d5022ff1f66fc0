use clap::{Parser, Subcommand};

use self::{auto_play::AutoPlayArg, benchmark::BenchmarkArg, train::TrainArg};

mod auto_play;
mod benchmark;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve placement weights with a genetic algorithm
    Train(#[clap(flatten)] TrainArg),
    /// Play several games with saved weights and rank them
    Benchmark(#[clap(flatten)] BenchmarkArg),
    /// Play one game with saved weights and print the final board
    AutoPlay(#[clap(flatten)] AutoPlayArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Benchmark(arg) => benchmark::run(&arg)?,
        Mode::AutoPlay(arg) => auto_play::run(&arg)?,
    }
    Ok(())
}
