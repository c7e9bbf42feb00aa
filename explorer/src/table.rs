//! The persisted results table.
//!
//! Plain comma-separated text: one header line, then one line per combination. The swept
//! parameters come first, in name order, followed by the metric columns.

use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use pipeline_sim::SimulationResult;

use crate::{
    error::SweepError,
    grid::{Combination, Parameter},
};

/// Metric columns, after the parameter columns.
pub const METRIC_COLUMNS: [&str; 7] = [
    "max_requests_in_window",
    "avg_requests_in_window",
    "throughput",
    "total_delivered",
    "total_batches",
    "pending_messages",
    "constraint_violated",
];

/// One line of the results table.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow {
    /// The swept parameter values.
    pub parameters: Combination,
    /// Most requests in any sampled window.
    pub max_requests_in_window: usize,
    /// Mean requests per sampled window, to one decimal place.
    pub avg_requests_in_window: f64,
    /// Delivered messages per second, to one decimal place.
    pub throughput: f64,
    /// Messages delivered.
    pub total_delivered: usize,
    /// Sends completed.
    pub total_batches: usize,
    /// Messages left buffered or waiting.
    pub pending_messages: usize,
    /// Whether the request ceiling was reached.
    pub constraint_violated: bool,
}

impl SweepRow {
    /// The row for one combination's result.
    pub fn new(parameters: Combination, result: &SimulationResult) -> Self {
        Self {
            parameters,
            max_requests_in_window: result.max_requests_in_window,
            avg_requests_in_window: round_to_tenth(result.avg_requests_in_window),
            throughput: round_to_tenth(result.throughput),
            total_delivered: result.total_messages_delivered,
            total_batches: result.total_batches_sent,
            pending_messages: result.pending_messages,
            constraint_violated: result.constraint_violated,
        }
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Writes the results table one row at a time.
///
/// Each row is flushed as soon as it is written, so a partially written table is valid up to
/// its last complete line.
#[derive(Debug)]
pub struct TableWriter<W> {
    sink: W,
    parameters: Vec<Parameter>,
}

impl<W: Write> TableWriter<W> {
    /// Write the header for the given parameter columns.
    pub fn new(mut sink: W, parameters: impl IntoIterator<Item = Parameter>) -> std::io::Result<Self> {
        let parameters: Vec<_> = parameters.into_iter().collect();

        let header: Vec<&str> = parameters
            .iter()
            .map(Parameter::as_str)
            .chain(METRIC_COLUMNS)
            .collect();
        writeln!(sink, "{}", header.join(","))?;
        sink.flush()?;

        Ok(Self { sink, parameters })
    }

    /// Append a row and flush it.
    ///
    /// Parameters the table has no column for are ignored. Missing ones are written empty.
    pub fn write_row(&mut self, row: &SweepRow) -> std::io::Result<()> {
        for parameter in &self.parameters {
            if let Some(value) = row.parameters.get(*parameter) {
                write!(self.sink, "{}", value)?;
            }
            write!(self.sink, ",")?;
        }

        writeln!(
            self.sink,
            "{},{},{},{},{},{},{}",
            row.max_requests_in_window,
            row.avg_requests_in_window,
            row.throughput,
            row.total_delivered,
            row.total_batches,
            row.pending_messages,
            row.constraint_violated,
        )?;

        self.sink.flush()
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// A results table read back from its text form.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepTable {
    parameters: Vec<Parameter>,
    rows: Vec<SweepRow>,
}

impl SweepTable {
    /// Parse a table previously written by a [`TableWriter`].
    ///
    /// Blank lines are skipped.
    pub fn read<R: BufRead>(reader: R) -> Result<Self, SweepError> {
        let mut lines = reader.lines().enumerate();

        let header = match lines.next() {
            Some((_, line)) => line?,
            None => return Err(table_error(1, "missing header")),
        };
        let parameters = parse_header(&header)?;
        let width = parameters.len() + METRIC_COLUMNS.len();

        let mut rows = Vec::new();
        for (index, line) in lines {
            let line = line?;
            let line_number = index + 1;

            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != width {
                return Err(table_error(
                    line_number,
                    format!("expected {} columns, found {}", width, fields.len()),
                ));
            }

            rows.push(parse_row(&parameters, &fields, line_number)?);
        }

        Ok(Self { parameters, rows })
    }

    /// Read the table stored at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SweepError> {
        Self::read(BufReader::new(File::open(path)?))
    }

    /// Parameter columns, in order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Rows, in the order they were written.
    pub fn rows(&self) -> &[SweepRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn parse_header(header: &str) -> Result<Vec<Parameter>, SweepError> {
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let split = columns.len().saturating_sub(METRIC_COLUMNS.len());
    let (parameter_columns, metric_columns) = columns.split_at(split);

    if metric_columns != METRIC_COLUMNS {
        return Err(table_error(
            1,
            format!("header should end with {}", METRIC_COLUMNS.join(",")),
        ));
    }

    let mut parameters = Vec::with_capacity(parameter_columns.len());
    for column in parameter_columns {
        let parameter = column
            .parse::<Parameter>()
            .map_err(|e| table_error(1, e.to_string()))?;
        if parameters.contains(&parameter) {
            return Err(table_error(1, format!("duplicate column `{}`", parameter)));
        }
        parameters.push(parameter);
    }

    Ok(parameters)
}

fn parse_row(parameters: &[Parameter], fields: &[&str], line: usize) -> Result<SweepRow, SweepError> {
    let (parameter_fields, metric_fields) = fields.split_at(parameters.len());

    let mut values = Vec::with_capacity(parameters.len());
    for (parameter, field) in parameters.iter().zip(parameter_fields) {
        if field.is_empty() {
            continue;
        }
        let value: f64 = parse_field(field, parameter.as_str(), line)?;
        values.push((*parameter, value));
    }

    Ok(SweepRow {
        parameters: values.into_iter().collect(),
        max_requests_in_window: parse_field(metric_fields[0], METRIC_COLUMNS[0], line)?,
        avg_requests_in_window: parse_field(metric_fields[1], METRIC_COLUMNS[1], line)?,
        throughput: parse_field(metric_fields[2], METRIC_COLUMNS[2], line)?,
        total_delivered: parse_field(metric_fields[3], METRIC_COLUMNS[3], line)?,
        total_batches: parse_field(metric_fields[4], METRIC_COLUMNS[4], line)?,
        pending_messages: parse_field(metric_fields[5], METRIC_COLUMNS[5], line)?,
        constraint_violated: parse_field(metric_fields[6], METRIC_COLUMNS[6], line)?,
    })
}

fn parse_field<T>(field: &str, column: &str, line: usize) -> Result<T, SweepError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    field
        .parse()
        .map_err(|e| table_error(line, format!("{}: invalid value `{}`: {}", column, field, e)))
}

fn table_error(line: usize, reason: impl Into<String>) -> SweepError {
    SweepError::Table {
        line,
        reason: reason.into(),
    }
}
