//! Errors.

use thiserror::Error;

/// A simulation parameter is out of range.
///
/// Always detected before any event is scheduled.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A rate or duration must be strictly positive.
    #[error("{field} must be greater than zero, got {value}")]
    NonPositive {
        /// The offending field.
        field: &'static str,
        /// The value given.
        value: f64,
    },

    /// A latency or sleep must not be negative.
    #[error("{field} must not be negative, got {value}")]
    Negative {
        /// The offending field.
        field: &'static str,
        /// The value given.
        value: f64,
    },

    /// NaN or infinity.
    #[error("{field} must be finite, got {value}")]
    NotFinite {
        /// The offending field.
        field: &'static str,
        /// The value given.
        value: f64,
    },

    /// A count must be at least one.
    #[error("{field} must be at least 1")]
    ZeroCount {
        /// The offending field.
        field: &'static str,
    },

    /// The latency range is inverted.
    #[error("api_latency_min ({min}) must not exceed api_latency_max ({max})")]
    LatencyRange {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
}

/// The engine broke one of its own invariants.
///
/// These are defects in the engine, never expected outcomes.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum InvariantViolation {
    /// A send completed while no send slot was occupied.
    #[error("send slot released while none were active")]
    SlotUnderflow,

    /// A send was admitted with every slot already occupied.
    #[error("send slot acquired beyond capacity {capacity}")]
    SlotOverflow {
        /// Pool capacity.
        capacity: usize,
    },

    /// A live buffering timeout fired for a key with nothing buffered.
    #[error("live buffering timeout fired for empty key {key}")]
    LiveTimeoutOnEmptyBuffer {
        /// The key whose state is inconsistent.
        key: usize,
    },

    /// An event referenced a key outside `[0, num_keys)`.
    #[error("event for unknown key {key} (num_keys = {num_keys})")]
    UnknownKey {
        /// The key carried by the event.
        key: usize,
        /// Number of keys in the run.
        num_keys: usize,
    },
}

/// An error that stopped a simulation run.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SimulationError {
    /// The configuration was rejected before the run started.
    #[error("invalid simulation config")]
    Config(#[from] ConfigError),

    /// The engine violated its invariants mid-run.
    #[error("simulation invariant violated")]
    Invariant(#[from] InvariantViolation),
}
