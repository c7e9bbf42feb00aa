//! Sweep the default parameter grid and print the best configurations.
//!
//! Usage: `explore [OUTPUT_CSV]`

use std::{
    fs::File,
    io::BufWriter,
    num::NonZeroUsize,
    path::PathBuf,
};

use explorer::{
    summary::{DEFAULT_NEAR_MISSES, DEFAULT_TOP},
    ParamGrid, Summary, Sweep, SweepConfig, SweepReporter, SweepTable, DEFAULT_OUTPUT,
};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let sweep = Sweep::new(ParamGrid::default(), SweepConfig::default());
    let concurrency = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);

    info!(
        combinations = sweep.len() as u64,
        output = %output.display(),
        "Exploring"
    );

    let stats = sweep
        .run_parallel(BufWriter::new(File::create(&output)?), concurrency)
        .await?;

    // Rank from the file, not from memory.
    let table = SweepTable::open(&output)?;
    let summary = Summary::from_table(&table, DEFAULT_TOP, DEFAULT_NEAR_MISSES)
        .with_ceiling(&sweep.config().base);

    SweepReporter::new(&summary)
        .with_stats(&stats)
        .with_output(&output)
        .print();

    Ok(())
}
