//! Printing sweep results

use std::path::Path;

use pipeline_sim::{SimulationConfig, SimulationResult};

use crate::{summary::Summary, sweep::SweepStats};

/// Prints the outcome of a single simulation run to stdout.
pub struct SimulationReporter<'a> {
    config: &'a SimulationConfig,
    result: &'a SimulationResult,
    seed: Option<u64>,
}

impl<'a> SimulationReporter<'a> {
    /// Create a new simulation reporter
    pub fn new(config: &'a SimulationConfig, result: &'a SimulationResult) -> Self {
        Self {
            config,
            result,
            seed: None,
        }
    }

    /// Also report the seed the run used.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Render the report.
    pub fn render(&self) -> String {
        let config = self.config;
        let result = self.result;
        let window = config.window_size;

        let mut report = String::from("=== Simulation Result ===\n");
        report.push_str(&format!("Config: {}\n", config));
        if let Some(seed) = self.seed {
            report.push_str(&format!("Seed:                   {}\n", seed));
        }
        report.push_str(&format!(
            "Max requests in {}s window: {}\n",
            window, result.max_requests_in_window
        ));
        report.push_str(&format!(
            "Avg requests in {}s window: {:.1}\n",
            window, result.avg_requests_in_window
        ));
        report.push_str(&format!(
            "Throughput:             {:.1} msg/s\n",
            result.throughput
        ));
        report.push_str(&format!(
            "Total delivered:        {}\n",
            result.total_messages_delivered
        ));
        report.push_str(&format!(
            "Total batches:          {}\n",
            result.total_batches_sent
        ));
        report.push_str(&format!(
            "Pending:                {}\n",
            result.pending_messages
        ));
        report.push_str(&format!(
            "In flight:              {}\n",
            result.in_flight_messages
        ));
        report.push_str(&format!(
            "Peak active sends:      {}/{}\n",
            result.peak_active_sends, config.max_concurrent_sends
        ));
        report.push_str(&format!(
            "Constraint violated:    {} (ceiling {} reqs/{}s)\n",
            result.constraint_violated, config.window_max_requests, window
        ));
        report
    }

    /// Print the report to stdout
    pub fn print(&self) {
        print!("{}", self.render());
    }
}

/// Prints a finished sweep's summary to stdout.
pub struct SweepReporter<'a> {
    summary: &'a Summary,
    stats: Option<&'a SweepStats>,
    output: Option<&'a Path>,
}

impl<'a> SweepReporter<'a> {
    /// Create a new sweep reporter
    pub fn new(summary: &'a Summary) -> Self {
        Self {
            summary,
            stats: None,
            output: None,
        }
    }

    /// Also report how the sweep itself went.
    pub fn with_stats(mut self, stats: &'a SweepStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Also report where the results table was written.
    pub fn with_output(mut self, output: &'a Path) -> Self {
        self.output = Some(output);
        self
    }

    /// Render the report.
    pub fn render(&self) -> String {
        let mut report = String::new();

        if let Some(stats) = self.stats {
            report.push_str(&format!(
                "\nCompleted in {:.1}s\n",
                stats.elapsed.as_secs_f64()
            ));
            report.push_str(&format!(
                "Constraint satisfied: {}/{}\n",
                stats.satisfied, stats.total
            ));
        }
        if let Some(output) = self.output {
            report.push_str(&format!("Results saved to {}\n", output.display()));
        }

        report.push('\n');
        report.push_str(&self.summary.to_string());
        report
    }

    /// Print the report to stdout
    pub fn print(&self) {
        print!("{}", self.render());
    }
}
