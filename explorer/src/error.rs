//! Errors.

use pipeline_sim::{ConfigError, SimulationError};
use thiserror::Error;

use crate::grid::Parameter;

/// A parameter grid was malformed.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GridError {
    /// The name doesn't match any sweepable parameter.
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    /// No parameters to sweep over.
    #[error("parameter grid is empty")]
    Empty,

    /// A parameter was given without any values.
    #[error("{parameter} has no values")]
    NoValues {
        /// The parameter.
        parameter: Parameter,
    },

    /// A count parameter was given a value that isn't a whole number.
    #[error("{parameter} must be a non-negative whole number, got {value}")]
    NotInteger {
        /// The parameter.
        parameter: Parameter,
        /// The value given.
        value: f64,
    },

    /// NaN or infinity.
    #[error("{parameter} must be finite, got {value}")]
    NotFinite {
        /// The parameter.
        parameter: Parameter,
        /// The value given.
        value: f64,
    },

    /// A count parameter was given a value that doesn't fit in a `usize`.
    #[error("{parameter} is too large, got {value}")]
    TooLarge {
        /// The parameter.
        parameter: Parameter,
        /// The value given.
        value: f64,
    },
}

/// An error that stopped a sweep.
///
/// Rows written before the error stay valid.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SweepError {
    /// A combination produced an invalid simulation config.
    #[error("invalid simulation config")]
    Config(#[from] ConfigError),

    /// A simulation run failed.
    #[error("simulation failed")]
    Simulation(#[from] SimulationError),

    /// The parameter grid was malformed.
    #[error("invalid parameter grid")]
    Grid(#[from] GridError),

    /// Writing or reading the results table failed.
    #[error("results table I/O failed")]
    Io(#[from] std::io::Error),

    /// The results table couldn't be parsed.
    #[error("malformed results table at line {line}: {reason}")]
    Table {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A simulation job panicked.
    #[error("simulation job panicked")]
    Panic,

    /// A simulation job was cancelled before it finished.
    #[error("simulation job was cancelled")]
    Cancelled,
}
