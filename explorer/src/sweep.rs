//! Running a simulation for every combination in a grid.

use std::io::Write;

use bon::bon;
use futures::{pin_mut, stream, StreamExt};
use pipeline_sim::{SimulationConfig, SimulationResult};
use tokio::{
    task::JoinError,
    time::{Duration, Instant},
};
use tracing::{info, span, Level, Span};

use crate::{
    error::SweepError,
    grid::{Combination, ParamGrid},
    table::{SweepRow, TableWriter},
};

/// Settings shared by every combination in a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Starting point for every combination. Swept parameters override it.
    pub base: SimulationConfig,
    /// Simulated duration of each run, in seconds.
    pub duration: f64,
    /// Seed for every run, so combinations are compared on the same arrivals.
    pub seed: u64,
    /// Log progress every this many rows. Zero disables progress logging.
    pub progress_every: usize,
}

#[bon]
impl SweepConfig {
    #[allow(missing_docs)]
    #[builder]
    pub fn new(
        /// Starting point for every combination.
        #[builder(default)]
        base: SimulationConfig,
        /// Simulated seconds per run.
        #[builder(default = 30.0)]
        duration: f64,
        /// Seed shared by every run.
        #[builder(default = 42)]
        seed: u64,
        /// Rows between progress logs.
        #[builder(default = 100)]
        progress_every: usize,
    ) -> Self {
        Self {
            base,
            duration,
            seed,
            progress_every,
        }
    }
}

impl SweepConfig {
    /// The full simulation config for one combination.
    pub fn simulation_config(&self, combination: &Combination) -> Result<SimulationConfig, SweepError> {
        let mut config = self.base.clone();
        config.simulation_duration = self.duration;
        combination.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Totals for a completed sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepStats {
    /// Rows written.
    pub total: usize,
    /// Rows under the request ceiling.
    pub satisfied: usize,
    /// Wall-clock time taken.
    pub elapsed: Duration,
}

/// A grid search over simulation configs.
///
/// Results are written as a table, one row per combination in [`ParamGrid::combinations()`]
/// order.
#[derive(Debug, Clone)]
pub struct Sweep {
    grid: ParamGrid,
    config: SweepConfig,
}

impl Sweep {
    /// A sweep over `grid`.
    pub fn new(grid: ParamGrid, config: SweepConfig) -> Self {
        Self { grid, config }
    }

    /// The grid being swept.
    pub fn grid(&self) -> &ParamGrid {
        &self.grid
    }

    /// The shared settings.
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Number of combinations.
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    /// Whether there is nothing to run.
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Run every combination, one after another, writing each row as soon as it is ready.
    pub fn run<W: Write>(&self, sink: W) -> Result<SweepStats, SweepError> {
        let total = self.len();
        let mut writer = TableWriter::new(sink, self.grid.parameters())?;
        let mut progress = Progress::new(total, self.config.progress_every);

        info!(total = total as u64, "Starting sweep");

        for (index, combination) in self.grid.combinations().enumerate() {
            let config = self.config.simulation_config(&combination)?;
            let result = combination_span(index, total)
                .in_scope(|| pipeline_sim::run(&config, self.config.seed))?;

            let row = SweepRow::new(combination, &result);
            writer.write_row(&row)?;
            progress.record(&row);
        }

        Ok(progress.finish())
    }

    /// Run up to `concurrency` combinations at once on the blocking thread pool.
    ///
    /// Rows are still written in combination order, so the table is identical to the one
    /// [`run()`](Self::run) writes.
    pub async fn run_parallel<W: Write>(
        &self,
        sink: W,
        concurrency: usize,
    ) -> Result<SweepStats, SweepError> {
        let total = self.len();
        let seed = self.config.seed;
        let mut writer = TableWriter::new(sink, self.grid.parameters())?;
        let mut progress = Progress::new(total, self.config.progress_every);

        info!(
            total = total as u64,
            concurrency = concurrency as u64,
            "Starting parallel sweep"
        );

        let results = stream::iter(self.grid.combinations().enumerate())
            .map(|(index, combination)| {
                let config = self.config.simulation_config(&combination);
                async move {
                    let config = config?;
                    let span = combination_span(index, total);

                    let result = tokio::task::spawn_blocking(move || {
                        span.in_scope(|| pipeline_sim::run(&config, seed))
                    })
                    .await
                    .map_err(join_error_to_sweep_error)??;

                    Ok::<(Combination, SimulationResult), SweepError>((combination, result))
                }
            })
            .buffered(concurrency.max(1));
        pin_mut!(results);

        while let Some(outcome) = results.next().await {
            let (combination, result) = outcome?;

            let row = SweepRow::new(combination, &result);
            writer.write_row(&row)?;
            progress.record(&row);
        }

        Ok(progress.finish())
    }
}

fn combination_span(index: usize, total: usize) -> Span {
    span!(
        Level::INFO,
        "run combination",
        sweep.index = index as u64,
        sweep.total = total as u64,
    )
}

fn join_error_to_sweep_error(join_err: JoinError) -> SweepError {
    if join_err.is_cancelled() {
        SweepError::Cancelled
    } else {
        SweepError::Panic
    }
}

/// Counts rows and logs how far through the sweep we are.
struct Progress {
    total: usize,
    every: usize,
    done: usize,
    satisfied: usize,
    started: Instant,
}

impl Progress {
    fn new(total: usize, every: usize) -> Self {
        Self {
            total,
            every,
            done: 0,
            satisfied: 0,
            started: Instant::now(),
        }
    }

    fn record(&mut self, row: &SweepRow) {
        self.done += 1;
        if !row.constraint_violated {
            self.satisfied += 1;
        }

        if self.every == 0 || (self.done % self.every != 0 && self.done != self.total) {
            return;
        }

        let elapsed = self.started.elapsed();
        let eta = elapsed.mul_f64((self.total - self.done) as f64 / self.done as f64);

        info!(
            done = self.done as u64,
            total = self.total as u64,
            elapsed_secs = elapsed.as_secs_f64(),
            eta_secs = eta.as_secs_f64(),
            satisfied = self.satisfied as u64,
            "Sweep progress"
        );
    }

    fn finish(self) -> SweepStats {
        let elapsed = self.started.elapsed();

        info!(
            total = self.done as u64,
            satisfied = self.satisfied as u64,
            elapsed_secs = elapsed.as_secs_f64(),
            "Sweep complete"
        );

        SweepStats {
            total: self.done,
            satisfied: self.satisfied,
            elapsed,
        }
    }
}
