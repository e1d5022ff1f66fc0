use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use blockfall_engine::PieceGeneration;
use blockfall_evaluator::board_feature::WeightVector;
use blockfall_training::model::WeightsFile;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

/// Writes `value` as pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn save_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let (mut writer, target): (Box<dyn Write>, String) = match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            (Box::new(BufWriter::new(file)), path.display().to_string())
        }
        None => (Box::new(io::stdout().lock()), "stdout".to_owned()),
    };

    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write JSON to {target}"))?;
    writeln!(writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to flush output to {target}"))?;
    Ok(())
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Reads a bare weight array or a trained model file.
pub fn read_weights_file<P>(path: P) -> anyhow::Result<WeightVector>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file: WeightsFile = read_json_file("weights", path)?;
    file.into_weights()
        .with_context(|| format!("Invalid weights file: {}", path.display()))
}

/// Expands directories into their `.json` files, sorted by name.
pub fn collect_json_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = vec![];
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        let entries = fs::read_dir(path)
            .with_context(|| format!("Failed to read directory: {}", path.display()))?;
        let mut found = vec![];
        for entry in entries {
            let entry = entry
                .with_context(|| format!("Failed to read directory: {}", path.display()))?;
            let file_path = entry.path();
            if file_path.is_file() && file_path.extension().is_some_and(|ext| ext == "json") {
                found.push(file_path);
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

/// Generator seeded with `seed`, or from the thread-local generator when absent.
pub fn seeded_rng(seed: Option<u64>) -> Pcg32 {
    match seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_rng(&mut rand::rng()),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PieceGenerationArg {
    /// Shuffled bags holding each piece once
    #[default]
    SevenBag,
    /// Independent uniform draws
    Uniform,
}

impl From<PieceGenerationArg> for PieceGeneration {
    fn from(arg: PieceGenerationArg) -> Self {
        match arg {
            PieceGenerationArg::SevenBag => Self::SevenBag,
            PieceGenerationArg::Uniform => Self::Uniform,
        }
    }
}
