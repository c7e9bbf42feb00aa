//! Run one simulation with the default config and print its metrics.
//!
//! Usage: `simulate [SEED]`

use explorer::SimulationReporter;
use pipeline_sim::SimulationConfig;
use tracing::{info, Level};

const DEFAULT_SEED: u64 = 42;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let seed = match std::env::args().nth(1) {
        Some(seed) => seed.parse()?,
        None => DEFAULT_SEED,
    };

    let config = SimulationConfig::default();
    info!(seed, config = %config, "Simulating");

    let result = pipeline_sim::run(&config, seed)?;

    SimulationReporter::new(&config, &result)
        .with_seed(seed)
        .print();

    Ok(())
}
