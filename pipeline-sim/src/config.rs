use std::fmt::{self, Display};

use bon::bon;

use crate::error::ConfigError;

/// Parameters for a single simulation run.
///
/// Times are in seconds. Construct with [`SimulationConfig::builder()`] or take the
/// [`Default`], then override fields as needed. [`validate()`](Self::validate) is called by the
/// engine before anything is scheduled.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Messages arriving per second.
    pub input_rate: f64,
    /// Number of distinct keys messages are spread across.
    pub num_keys: usize,
    /// Messages per batch.
    pub batch_size: usize,
    /// How long a key's buffer may stay open before it is flushed.
    pub max_buffering_duration: f64,
    /// Maximum number of sends in flight at once.
    pub max_concurrent_sends: usize,
    /// Lower bound of the uniformly distributed API latency.
    pub api_latency_min: f64,
    /// Upper bound of the uniformly distributed API latency.
    pub api_latency_max: f64,
    /// Fixed extra time added to every send.
    pub send_sleep: f64,
    /// Length of the arrival timeline.
    pub simulation_duration: f64,
    /// Width of the sliding window the request ceiling applies to.
    pub window_size: f64,
    /// Request ceiling per window. Reaching it counts as a violation.
    pub window_max_requests: usize,
}

#[bon]
impl SimulationConfig {
    #[allow(missing_docs)]
    #[builder]
    pub fn new(
        /// Messages arriving per second.
        #[builder(default = 4000.0)]
        input_rate: f64,
        /// Number of distinct keys.
        #[builder(default = 10)]
        num_keys: usize,
        /// Messages per batch.
        #[builder(default = 40)]
        batch_size: usize,
        /// Buffering timeout, in seconds.
        #[builder(default = 2.0)]
        max_buffering_duration: f64,
        /// Maximum sends in flight.
        #[builder(default = 5)]
        max_concurrent_sends: usize,
        /// Minimum API latency, in seconds.
        #[builder(default = 0.0)]
        api_latency_min: f64,
        /// Maximum API latency, in seconds.
        #[builder(default = 1.0)]
        api_latency_max: f64,
        /// Extra time added to every send, in seconds.
        #[builder(default = 0.0)]
        send_sleep: f64,
        /// Length of the arrival timeline, in seconds.
        #[builder(default = 30.0)]
        simulation_duration: f64,
        /// Sliding window width, in seconds.
        #[builder(default = 3.0)]
        window_size: f64,
        /// Requests allowed per window.
        #[builder(default = 165)]
        window_max_requests: usize,
    ) -> Self {
        Self {
            input_rate,
            num_keys,
            batch_size,
            max_buffering_duration,
            max_concurrent_sends,
            api_latency_min,
            api_latency_max,
            send_sleep,
            simulation_duration,
            window_size,
            window_max_requests,
        }
    }
}

impl SimulationConfig {
    /// Check every parameter is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("input_rate", self.input_rate)?;
        positive("max_buffering_duration", self.max_buffering_duration)?;
        positive("simulation_duration", self.simulation_duration)?;
        positive("window_size", self.window_size)?;

        non_negative("api_latency_min", self.api_latency_min)?;
        non_negative("api_latency_max", self.api_latency_max)?;
        non_negative("send_sleep", self.send_sleep)?;

        at_least_one("num_keys", self.num_keys)?;
        at_least_one("batch_size", self.batch_size)?;
        at_least_one("max_concurrent_sends", self.max_concurrent_sends)?;
        at_least_one("window_max_requests", self.window_max_requests)?;

        if self.api_latency_min > self.api_latency_max {
            return Err(ConfigError::LatencyRange {
                min: self.api_latency_min,
                max: self.api_latency_max,
            });
        }

        Ok(())
    }

    /// Number of messages the arrival timeline will contain.
    pub fn total_arrivals(&self) -> usize {
        (self.input_rate * self.simulation_duration).floor() as usize
    }

    /// Gap between consecutive arrivals.
    pub fn arrival_interval(&self) -> f64 {
        1.0 / self.input_rate
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Display for SimulationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rate: {}/s, keys: {}, batch: {}, buffer: {}s, concurrency: {}, latency: {}..{}s, \
             sleep: {}s, duration: {}s, window: {} per {}s",
            self.input_rate,
            self.num_keys,
            self.batch_size,
            self.max_buffering_duration,
            self.max_concurrent_sends,
            self.api_latency_min,
            self.api_latency_max,
            self.send_sleep,
            self.simulation_duration,
            self.window_max_requests,
            self.window_size,
        )
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn at_least_one(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(ConfigError::ZeroCount { field })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimulationConfig::default();

        assert_eq!(config.input_rate, 4000.0);
        assert_eq!(config.batch_size, 40);
        assert_eq!(config.window_max_requests, 165);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_keys() {
        let config = SimulationConfig::builder().num_keys(0).build();

        assert_matches!(
            config.validate(),
            Err(ConfigError::ZeroCount { field: "num_keys" })
        );
    }

    #[test]
    fn rejects_inverted_latency_range() {
        let config = SimulationConfig::builder()
            .api_latency_min(0.5)
            .api_latency_max(0.1)
            .build();

        assert_matches!(config.validate(), Err(ConfigError::LatencyRange { .. }));
    }

    #[test]
    fn rejects_non_positive_durations() {
        let config = SimulationConfig::builder().window_size(0.0).build();
        assert_matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "window_size",
                ..
            })
        );

        let config = SimulationConfig::builder().input_rate(-1.0).build();
        assert_matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "input_rate",
                ..
            })
        );
    }

    #[test]
    fn rejects_nan() {
        let config = SimulationConfig::builder().send_sleep(f64::NAN).build();

        assert_matches!(
            config.validate(),
            Err(ConfigError::NotFinite {
                field: "send_sleep",
                ..
            })
        );
    }

    #[test]
    fn total_arrivals_is_floored() {
        let config = SimulationConfig::builder()
            .input_rate(10.0)
            .simulation_duration(1.05)
            .build();

        assert_eq!(config.total_arrivals(), 10);
    }
}
