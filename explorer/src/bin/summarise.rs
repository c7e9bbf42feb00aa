//! Rank an existing results table without re-running the sweep.
//!
//! Usage: `summarise [INPUT_CSV]`

use std::path::PathBuf;

use explorer::{
    summary::{DEFAULT_NEAR_MISSES, DEFAULT_TOP},
    Summary, SweepConfig, SweepReporter, SweepTable, DEFAULT_OUTPUT,
};
use tracing::{info, Level};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let input = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let table = SweepTable::open(&input)?;
    info!(rows = table.len() as u64, input = %input.display(), "Read results table");

    // `explore` judges every row against the default base config.
    let summary = Summary::from_table(&table, DEFAULT_TOP, DEFAULT_NEAR_MISSES)
        .with_ceiling(&SweepConfig::default().base);

    SweepReporter::new(&summary).print();

    Ok(())
}
