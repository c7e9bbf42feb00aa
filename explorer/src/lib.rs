//! Grid search over pipeline simulation parameters.
//!
//! Every combination of a [`ParamGrid`] is simulated with the same seed. Results stream to a
//! comma-separated table one row at a time, and a ranked [`Summary`] can be derived from that
//! table alone.

#![deny(missing_docs)]

pub mod error;
pub mod grid;
pub mod reporter;
pub mod summary;
pub mod sweep;
pub mod table;

pub use error::{GridError, SweepError};
pub use grid::{Combination, ParamGrid, Parameter};
pub use reporter::{SimulationReporter, SweepReporter};
pub use summary::Summary;
pub use sweep::{Sweep, SweepConfig, SweepStats};
pub use table::{SweepRow, SweepTable, TableWriter};

/// Where the `explore` binary writes its table, and where `summarise` reads it from, unless told
/// otherwise.
pub const DEFAULT_OUTPUT: &str = "exploration_results.csv";
