//! Ranking sweep results.

use std::fmt::{self, Display};

use pipeline_sim::SimulationConfig;

use crate::{grid::Parameter, table::SweepRow, table::SweepTable};

/// How many satisfying rows to show by default.
pub const DEFAULT_TOP: usize = 20;
/// How many near misses to show by default.
pub const DEFAULT_NEAR_MISSES: usize = 10;

/// The best configurations from a sweep, and the ones that came closest to passing.
///
/// Derived from a results table alone, so it can be recomputed from the persisted file at any
/// time.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    parameters: Vec<Parameter>,
    total: usize,
    satisfied: usize,
    top: Vec<SweepRow>,
    near_misses: Vec<SweepRow>,
    ceiling: Option<Ceiling>,
}

/// The request limit every row was judged against.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ceiling {
    max_requests: usize,
    window_size: f64,
}

impl Summary {
    /// Rank the rows of `table`.
    ///
    /// `top` holds up to `top_n` rows under the ceiling, highest throughput first. `near_misses`
    /// holds up to `near_miss_n` rows that reached it, fewest requests per window first. Ties
    /// keep table order.
    pub fn from_table(table: &SweepTable, top_n: usize, near_miss_n: usize) -> Self {
        let (mut satisfied, mut violated): (Vec<&SweepRow>, Vec<&SweepRow>) = table
            .rows()
            .iter()
            .partition(|row| !row.constraint_violated);

        let total = table.len();
        let satisfied_count = satisfied.len();

        // Stable sorts.
        satisfied.sort_by(|a, b| b.throughput.total_cmp(&a.throughput));
        violated.sort_by_key(|row| row.max_requests_in_window);

        Self {
            parameters: table.parameters().to_vec(),
            total,
            satisfied: satisfied_count,
            top: satisfied.into_iter().take(top_n).cloned().collect(),
            near_misses: violated.into_iter().take(near_miss_n).cloned().collect(),
            ceiling: None,
        }
    }

    /// Show the request ceiling from `base` in the headline counts.
    ///
    /// Ignored if the table sweeps `window_max_requests` or `window_size`, since rows were then
    /// judged against different ceilings.
    pub fn with_ceiling(mut self, base: &SimulationConfig) -> Self {
        let swept = self
            .parameters
            .iter()
            .any(|p| matches!(p, Parameter::WindowMaxRequests | Parameter::WindowSize));

        self.ceiling = (!swept).then_some(Ceiling {
            max_requests: base.window_max_requests,
            window_size: base.window_size,
        });
        self
    }

    /// Number of rows summarised.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Rows under the request ceiling.
    pub fn satisfied(&self) -> usize {
        self.satisfied
    }

    /// Rows that reached the request ceiling.
    pub fn violated(&self) -> usize {
        self.total - self.satisfied
    }

    /// Best satisfying rows.
    pub fn top(&self) -> &[SweepRow] {
        &self.top
    }

    /// Violating rows closest to the ceiling.
    pub fn near_misses(&self) -> &[SweepRow] {
        &self.near_misses
    }

    fn write_rows(&self, f: &mut fmt::Formatter<'_>, rows: &[SweepRow]) -> fmt::Result {
        for parameter in &self.parameters {
            write!(f, "{:>w$} ", parameter.label(), w = column_width(*parameter))?;
        }
        writeln!(
            f,
            "{:>7} {:>7} {:>8} {:>8}",
            "max/win", "avg/win", "tput", "pending"
        )?;
        writeln!(f, "{}", "-".repeat(80))?;

        for row in rows {
            for parameter in &self.parameters {
                let w = column_width(*parameter);
                match row.parameters.get(*parameter) {
                    Some(value) => write!(f, "{:>w$} ", value, w = w)?,
                    None => write!(f, "{:>w$} ", "-", w = w)?,
                }
            }
            writeln!(
                f,
                "{:>7} {:>7} {:>8.1} {:>8}",
                row.max_requests_in_window,
                row.avg_requests_in_window,
                row.throughput,
                row.pending_messages
            )?;
        }

        Ok(())
    }
}

fn column_width(parameter: Parameter) -> usize {
    parameter.label().len().max(5)
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(80))?;
        writeln!(f, "EXPLORATION SUMMARY")?;
        writeln!(f, "{}", "=".repeat(80))?;
        writeln!(f, "Total combinations: {}", self.total)?;
        match self.ceiling {
            Some(Ceiling {
                max_requests,
                window_size,
            }) => {
                writeln!(
                    f,
                    "Constraint satisfied (< {max_requests} reqs/{window_size}s): {}",
                    self.satisfied
                )?;
                writeln!(
                    f,
                    "Constraint violated (>= {max_requests} reqs/{window_size}s): {}",
                    self.violated()
                )?;
            }
            None => {
                writeln!(f, "Constraint satisfied: {}", self.satisfied)?;
                writeln!(f, "Constraint violated: {}", self.violated())?;
            }
        }

        if !self.top.is_empty() {
            writeln!(
                f,
                "\n--- Top {} (highest throughput, constraint satisfied) ---",
                self.top.len()
            )?;
            self.write_rows(f, &self.top)?;
        }

        if !self.near_misses.is_empty() {
            writeln!(f, "\n--- Near misses (fewest requests per window, constraint violated) ---")?;
            self.write_rows(f, &self.near_misses)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableWriter;

    fn row(num_keys: f64, max: usize, throughput: f64) -> SweepRow {
        SweepRow {
            parameters: [(Parameter::NumKeys, num_keys)].into_iter().collect(),
            max_requests_in_window: max,
            avg_requests_in_window: max as f64 / 2.0,
            throughput,
            total_delivered: 0,
            total_batches: 0,
            pending_messages: 0,
            constraint_violated: max >= 165,
        }
    }

    fn table(rows: &[SweepRow]) -> SweepTable {
        let mut writer = TableWriter::new(Vec::new(), [Parameter::NumKeys]).unwrap();
        for row in rows {
            writer.write_row(row).unwrap();
        }
        SweepTable::read(writer.into_inner().as_slice()).unwrap()
    }

    fn keys(rows: &[SweepRow]) -> Vec<f64> {
        rows.iter()
            .map(|row| row.parameters.get(Parameter::NumKeys).unwrap())
            .collect()
    }

    #[test]
    fn ranks_by_throughput_then_by_closeness() {
        let table = table(&[
            row(1.0, 100, 3000.0),
            row(2.0, 170, 3990.0),
            row(3.0, 150, 3500.0),
            row(4.0, 166, 3980.0),
            row(5.0, 164, 3900.0),
        ]);

        let summary = Summary::from_table(&table, DEFAULT_TOP, DEFAULT_NEAR_MISSES);

        assert_eq!(summary.total(), 5);
        assert_eq!(summary.satisfied(), 3);
        assert_eq!(summary.violated(), 2);
        assert_eq!(keys(summary.top()), vec![5.0, 3.0, 1.0]);
        assert_eq!(keys(summary.near_misses()), vec![4.0, 2.0]);
    }

    #[test]
    fn ties_keep_table_order() {
        let table = table(&[
            row(1.0, 100, 3000.0),
            row(2.0, 120, 3000.0),
            row(3.0, 200, 3000.0),
            row(4.0, 200, 3000.0),
        ]);

        let summary = Summary::from_table(&table, DEFAULT_TOP, DEFAULT_NEAR_MISSES);

        assert_eq!(keys(summary.top()), vec![1.0, 2.0]);
        assert_eq!(keys(summary.near_misses()), vec![3.0, 4.0]);
    }

    #[test]
    fn truncates() {
        let rows: Vec<_> = (0..30).map(|i| row(i as f64, 100, i as f64)).collect();

        let summary = Summary::from_table(&table(&rows), 20, 10);

        assert_eq!(summary.top().len(), 20);
        assert_eq!(summary.top()[0].throughput, 29.0);
        assert!(summary.near_misses().is_empty());
    }

    #[test]
    fn empty_table() {
        let summary = Summary::from_table(&table(&[]), DEFAULT_TOP, DEFAULT_NEAR_MISSES);

        assert_eq!(summary.total(), 0);
        assert!(summary.top().is_empty());

        let text = summary.to_string();
        assert!(text.contains("Total combinations: 0"));
        assert!(!text.contains("Top"));
    }

    #[test]
    fn renders_sections() {
        let table = table(&[row(10.0, 150, 3933.3), row(20.0, 170, 3999.9)]);

        let text = Summary::from_table(&table, DEFAULT_TOP, DEFAULT_NEAR_MISSES).to_string();

        assert!(text.contains("Top 1 (highest throughput"));
        assert!(text.contains("Near misses"));
        assert!(text.contains(" keys "));
        assert!(text.contains("3933.3"));
    }

    #[test]
    fn headline_shows_the_ceiling() {
        let table = table(&[row(10.0, 150, 3933.3), row(20.0, 170, 3999.9)]);
        let summary = Summary::from_table(&table, DEFAULT_TOP, DEFAULT_NEAR_MISSES);

        let plain = summary.to_string();
        assert!(plain.contains("Constraint satisfied: 1"));
        assert!(plain.contains("Constraint violated: 1"));

        let text = summary.with_ceiling(&SimulationConfig::default()).to_string();
        assert!(text.contains("Constraint satisfied (< 165 reqs/3s): 1"));
        assert!(text.contains("Constraint violated (>= 165 reqs/3s): 1"));
    }

    #[test]
    fn swept_ceiling_is_not_shown() {
        let mut writer =
            TableWriter::new(Vec::new(), [Parameter::NumKeys, Parameter::WindowMaxRequests])
                .unwrap();
        let mut swept = row(10.0, 150, 3933.3);
        swept.parameters = [
            (Parameter::NumKeys, 10.0),
            (Parameter::WindowMaxRequests, 200.0),
        ]
        .into_iter()
        .collect();
        writer.write_row(&swept).unwrap();
        let table = SweepTable::read(writer.into_inner().as_slice()).unwrap();

        let text = Summary::from_table(&table, DEFAULT_TOP, DEFAULT_NEAR_MISSES)
            .with_ceiling(&SimulationConfig::default())
            .to_string();

        assert!(text.contains("Constraint satisfied: 1"));
        assert!(!text.contains("reqs/"));
    }
}
