//! Parameter grids and their combinations.

use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    str::FromStr,
};

use pipeline_sim::SimulationConfig;

use crate::error::GridError;

/// A [`SimulationConfig`] field that can be swept.
///
/// Ordered by name, which fixes the column order of the results table and the order
/// combinations are enumerated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parameter {
    /// [`SimulationConfig::api_latency_max`]
    ApiLatencyMax,
    /// [`SimulationConfig::api_latency_min`]
    ApiLatencyMin,
    /// [`SimulationConfig::batch_size`]
    BatchSize,
    /// [`SimulationConfig::input_rate`]
    InputRate,
    /// [`SimulationConfig::max_buffering_duration`]
    MaxBufferingDuration,
    /// [`SimulationConfig::max_concurrent_sends`]
    MaxConcurrentSends,
    /// [`SimulationConfig::num_keys`]
    NumKeys,
    /// [`SimulationConfig::send_sleep`]
    SendSleep,
    /// [`SimulationConfig::window_max_requests`]
    WindowMaxRequests,
    /// [`SimulationConfig::window_size`]
    WindowSize,
}

impl Parameter {
    /// Every sweepable parameter, in order.
    pub const ALL: [Parameter; 10] = [
        Parameter::ApiLatencyMax,
        Parameter::ApiLatencyMin,
        Parameter::BatchSize,
        Parameter::InputRate,
        Parameter::MaxBufferingDuration,
        Parameter::MaxConcurrentSends,
        Parameter::NumKeys,
        Parameter::SendSleep,
        Parameter::WindowMaxRequests,
        Parameter::WindowSize,
    ];

    /// The config field name, as used in the results table header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::ApiLatencyMax => "api_latency_max",
            Parameter::ApiLatencyMin => "api_latency_min",
            Parameter::BatchSize => "batch_size",
            Parameter::InputRate => "input_rate",
            Parameter::MaxBufferingDuration => "max_buffering_duration",
            Parameter::MaxConcurrentSends => "max_concurrent_sends",
            Parameter::NumKeys => "num_keys",
            Parameter::SendSleep => "send_sleep",
            Parameter::WindowMaxRequests => "window_max_requests",
            Parameter::WindowSize => "window_size",
        }
    }

    /// Short column heading for the console summary.
    pub fn label(&self) -> &'static str {
        match self {
            Parameter::ApiLatencyMax => "lat_max",
            Parameter::ApiLatencyMin => "lat_min",
            Parameter::BatchSize => "batch",
            Parameter::InputRate => "rate",
            Parameter::MaxBufferingDuration => "buffer",
            Parameter::MaxConcurrentSends => "concur",
            Parameter::NumKeys => "keys",
            Parameter::SendSleep => "sleep",
            Parameter::WindowMaxRequests => "ceiling",
            Parameter::WindowSize => "window",
        }
    }

    /// Whether the underlying field is a count.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Parameter::BatchSize
                | Parameter::MaxConcurrentSends
                | Parameter::NumKeys
                | Parameter::WindowMaxRequests
        )
    }

    /// Check `value` can be assigned to this parameter.
    ///
    /// Range checks are left to [`SimulationConfig::validate()`].
    pub fn check(&self, value: f64) -> Result<(), GridError> {
        if !value.is_finite() {
            return Err(GridError::NotFinite {
                parameter: *self,
                value,
            });
        }
        if self.is_integer() && (value < 0.0 || value.fract() != 0.0) {
            return Err(GridError::NotInteger {
                parameter: *self,
                value,
            });
        }
        // `usize::MAX as f64` rounds up to a power of two.
        if self.is_integer() && value >= usize::MAX as f64 {
            return Err(GridError::TooLarge {
                parameter: *self,
                value,
            });
        }
        Ok(())
    }

    /// Override this parameter in `config`.
    pub fn apply(&self, config: &mut SimulationConfig, value: f64) -> Result<(), GridError> {
        self.check(value)?;
        let count = value as usize;

        match self {
            Parameter::ApiLatencyMax => config.api_latency_max = value,
            Parameter::ApiLatencyMin => config.api_latency_min = value,
            Parameter::BatchSize => config.batch_size = count,
            Parameter::InputRate => config.input_rate = value,
            Parameter::MaxBufferingDuration => config.max_buffering_duration = value,
            Parameter::MaxConcurrentSends => config.max_concurrent_sends = count,
            Parameter::NumKeys => config.num_keys = count,
            Parameter::SendSleep => config.send_sleep = value,
            Parameter::WindowMaxRequests => config.window_max_requests = count,
            Parameter::WindowSize => config.window_size = value,
        }

        Ok(())
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parameter {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parameter::ALL
            .into_iter()
            .find(|parameter| parameter.as_str() == s)
            .ok_or_else(|| GridError::UnknownParameter(s.to_string()))
    }
}

/// Candidate values for each swept parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    values: BTreeMap<Parameter, Vec<f64>>,
}

impl ParamGrid {
    /// Build a grid, checking every value up front.
    ///
    /// Later entries for the same parameter replace earlier ones.
    pub fn new(values: impl IntoIterator<Item = (Parameter, Vec<f64>)>) -> Result<Self, GridError> {
        let values: BTreeMap<_, _> = values.into_iter().collect();

        if values.is_empty() {
            return Err(GridError::Empty);
        }

        for (parameter, candidates) in &values {
            if candidates.is_empty() {
                return Err(GridError::NoValues {
                    parameter: *parameter,
                });
            }
            for value in candidates {
                parameter.check(*value)?;
            }
        }

        Ok(Self { values })
    }

    /// Swept parameters, in column order.
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> + '_ {
        self.values.keys().copied()
    }

    /// Candidate values for `parameter`, if swept.
    pub fn values(&self, parameter: Parameter) -> Option<&[f64]> {
        self.values.get(&parameter).map(Vec::as_slice)
    }

    /// Number of combinations.
    pub fn len(&self) -> usize {
        self.values.values().map(Vec::len).product()
    }

    /// Whether there are no combinations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every combination of values.
    ///
    /// The last parameter (by name) varies fastest. Values are taken in the order given.
    pub fn combinations(&self) -> Combinations<'_> {
        let axes: Vec<_> = self
            .values
            .iter()
            .map(|(parameter, values)| (*parameter, values.as_slice()))
            .collect();

        Combinations {
            indices: vec![0; axes.len()],
            axes,
            done: false,
        }
    }
}

impl Default for ParamGrid {
    /// The batching and concurrency settings worth exploring for a 4000 msg/s pipeline.
    fn default() -> Self {
        Self {
            values: BTreeMap::from([
                (Parameter::NumKeys, vec![1.0, 2.0, 3.0, 5.0, 10.0, 20.0]),
                (
                    Parameter::BatchSize,
                    vec![20.0, 25.0, 30.0, 35.0, 40.0, 50.0, 75.0],
                ),
                (
                    Parameter::MaxBufferingDuration,
                    vec![0.5, 1.0, 2.0, 3.0, 5.0, 10.0],
                ),
                (
                    Parameter::MaxConcurrentSends,
                    vec![1.0, 2.0, 3.0, 5.0, 10.0],
                ),
                (Parameter::SendSleep, vec![0.0, 0.3, 0.5, 0.8, 1.0, 1.5]),
            ]),
        }
    }
}

/// One value for each swept parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Combination {
    values: BTreeMap<Parameter, f64>,
}

impl Combination {
    /// The value chosen for `parameter`, if swept.
    pub fn get(&self, parameter: Parameter) -> Option<f64> {
        self.values.get(&parameter).copied()
    }

    /// `(parameter, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, f64)> + '_ {
        self.values.iter().map(|(parameter, value)| (*parameter, *value))
    }

    /// Apply every override to `config`.
    pub fn apply(&self, config: &mut SimulationConfig) -> Result<(), GridError> {
        for (parameter, value) in self.iter() {
            parameter.apply(config, value)?;
        }
        Ok(())
    }
}

impl FromIterator<(Parameter, f64)> for Combination {
    fn from_iter<T: IntoIterator<Item = (Parameter, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Iterator over a grid's combinations. See [`ParamGrid::combinations()`].
#[derive(Debug)]
pub struct Combinations<'a> {
    axes: Vec<(Parameter, &'a [f64])>,
    indices: Vec<usize>,
    done: bool,
}

impl Iterator for Combinations<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        if self.done {
            return None;
        }

        let combination = self
            .axes
            .iter()
            .zip(&self.indices)
            .map(|((parameter, values), index)| (*parameter, values[*index]))
            .collect();

        // Odometer: bump the last axis, carrying leftwards.
        self.done = true;
        for axis in (0..self.axes.len()).rev() {
            self.indices[axis] += 1;
            if self.indices[axis] < self.axes[axis].1.len() {
                self.done = false;
                break;
            }
            self.indices[axis] = 0;
        }

        Some(combination)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn ordered_by_name() {
        let mut names: Vec<_> = Parameter::ALL.iter().map(Parameter::as_str).collect();
        names.sort_unstable();

        let ordered: Vec<_> = Parameter::ALL.iter().map(Parameter::as_str).collect();
        assert_eq!(names, ordered);

        let mut sorted = Parameter::ALL;
        sorted.sort();
        assert_eq!(sorted, Parameter::ALL);
    }

    #[test]
    fn parse_names() {
        for parameter in Parameter::ALL {
            assert_eq!(parameter.as_str().parse::<Parameter>(), Ok(parameter));
        }

        assert_matches!(
            "num_keyz".parse::<Parameter>(),
            Err(GridError::UnknownParameter(name)) if name == "num_keyz"
        );
    }

    #[test]
    fn last_parameter_varies_fastest() {
        let grid = ParamGrid::new([
            (Parameter::SendSleep, vec![0.0, 0.5]),
            (Parameter::BatchSize, vec![10.0, 20.0, 30.0]),
        ])
        .unwrap();

        let combinations: Vec<_> = grid
            .combinations()
            .map(|c| {
                (
                    c.get(Parameter::BatchSize).unwrap(),
                    c.get(Parameter::SendSleep).unwrap(),
                )
            })
            .collect();

        assert_eq!(
            combinations,
            vec![
                (10.0, 0.0),
                (10.0, 0.5),
                (20.0, 0.0),
                (20.0, 0.5),
                (30.0, 0.0),
                (30.0, 0.5),
            ]
        );
        assert_eq!(grid.len(), 6);
    }

    #[test]
    fn single_value_grid() {
        let grid = ParamGrid::new([(Parameter::NumKeys, vec![3.0])]).unwrap();

        let combinations: Vec<_> = grid.combinations().collect();

        assert_eq!(combinations.len(), 1);
        assert_eq!(combinations[0].get(Parameter::NumKeys), Some(3.0));
    }

    #[test]
    fn default_grid_size() {
        let grid = ParamGrid::default();

        assert_eq!(grid.len(), 6 * 7 * 6 * 5 * 6);
        assert_eq!(grid.combinations().count(), grid.len());
        assert_eq!(
            grid.parameters().collect::<Vec<_>>(),
            vec![
                Parameter::BatchSize,
                Parameter::MaxBufferingDuration,
                Parameter::MaxConcurrentSends,
                Parameter::NumKeys,
                Parameter::SendSleep,
            ]
        );
    }

    #[test]
    fn rejects_bad_grids() {
        assert_matches!(
            ParamGrid::new(Vec::<(Parameter, Vec<f64>)>::new()),
            Err(GridError::Empty)
        );

        assert_matches!(
            ParamGrid::new([(Parameter::BatchSize, Vec::<f64>::new())]),
            Err(GridError::NoValues {
                parameter: Parameter::BatchSize
            })
        );

        assert_matches!(
            ParamGrid::new([(Parameter::NumKeys, vec![1.0, 2.5])]),
            Err(GridError::NotInteger {
                parameter: Parameter::NumKeys,
                ..
            })
        );

        assert_matches!(
            ParamGrid::new([(Parameter::MaxConcurrentSends, vec![-1.0])]),
            Err(GridError::NotInteger { .. })
        );

        assert_matches!(
            ParamGrid::new([(Parameter::SendSleep, vec![f64::INFINITY])]),
            Err(GridError::NotFinite { .. })
        );
    }

    #[test]
    fn rejects_counts_too_large_for_usize() {
        assert_matches!(
            ParamGrid::new([(Parameter::NumKeys, vec![1e30])]),
            Err(GridError::TooLarge {
                parameter: Parameter::NumKeys,
                ..
            })
        );

        assert_matches!(
            ParamGrid::new([(Parameter::BatchSize, vec![usize::MAX as f64])]),
            Err(GridError::TooLarge { .. })
        );

        let mut config = SimulationConfig::default();
        assert_matches!(
            Parameter::WindowMaxRequests.apply(&mut config, 1e20),
            Err(GridError::TooLarge { .. })
        );
        assert_eq!(
            config.window_max_requests,
            SimulationConfig::default().window_max_requests
        );

        // Only counts are bounded here.
        assert!(ParamGrid::new([(Parameter::InputRate, vec![1e30])]).is_ok());
    }

    #[test]
    fn apply_overrides() {
        let combination: Combination = [
            (Parameter::BatchSize, 25.0),
            (Parameter::SendSleep, 0.3),
        ]
        .into_iter()
        .collect();
        let mut config = SimulationConfig::default();

        combination.apply(&mut config).unwrap();

        assert_eq!(config.batch_size, 25);
        assert_eq!(config.send_sleep, 0.3);
        assert_eq!(config.num_keys, SimulationConfig::default().num_keys);
    }
}
