//! Send duration modelling.

use rand::{
    distr::{Distribution, Uniform},
    Rng,
};

use crate::{config::SimulationConfig, error::ConfigError};

/// How long a send occupies its slot.
///
/// API latency is uniformly distributed over `[api_latency_min, api_latency_max]`, then a fixed
/// `send_sleep` is added on top.
#[derive(Debug, Clone)]
pub(crate) struct LatencyProfile {
    latency: Uniform<f64>,
    send_sleep: f64,
}

impl LatencyProfile {
    pub(crate) fn new(config: &SimulationConfig) -> Result<Self, ConfigError> {
        let latency = Uniform::new_inclusive(config.api_latency_min, config.api_latency_max)
            .map_err(|_| ConfigError::LatencyRange {
                min: config.api_latency_min,
                max: config.api_latency_max,
            })?;

        Ok(Self {
            latency,
            send_sleep: config.send_sleep,
        })
    }

    /// Sample a send duration. Consumes exactly one draw from `rng`.
    pub(crate) fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        self.latency.sample(rng) + self.send_sleep
    }
}
