//! Arrival timeline generation.

use rand::Rng;

use crate::{config::SimulationConfig, event::Timestamp};

/// A message arriving for a key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Arrival {
    pub(crate) at: Timestamp,
    pub(crate) key: usize,
}

/// Evenly spaced arrivals, each assigned a uniformly random key.
///
/// One arrival every `1 / input_rate` seconds starting at zero, `floor(input_rate *
/// simulation_duration)` in total. The number of arrivals never depends on what happens
/// downstream.
pub(crate) struct ArrivalSchedule<'a, R> {
    interval: f64,
    num_keys: usize,
    remaining: std::ops::Range<usize>,
    rng: &'a mut R,
}

impl<'a, R: Rng> ArrivalSchedule<'a, R> {
    pub(crate) fn new(config: &SimulationConfig, rng: &'a mut R) -> Self {
        Self {
            interval: config.arrival_interval(),
            num_keys: config.num_keys,
            remaining: 0..config.total_arrivals(),
            rng,
        }
    }
}

impl<R: Rng> Iterator for ArrivalSchedule<'_, R> {
    type Item = Arrival;

    fn next(&mut self) -> Option<Arrival> {
        let index = self.remaining.next()?;

        // Multiply rather than accumulate, so late arrivals don't drift.
        let at = index as f64 * self.interval;
        let key = self.rng.random_range(0..self.num_keys);

        Some(Arrival { at, key })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.remaining.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn evenly_spaced_from_zero() {
        let config = SimulationConfig::builder()
            .input_rate(4.0)
            .simulation_duration(1.0)
            .num_keys(1)
            .build();
        let mut rng = StdRng::seed_from_u64(42);

        let times: Vec<_> = ArrivalSchedule::new(&config, &mut rng)
            .map(|arrival| arrival.at)
            .collect();

        assert_eq!(times, vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn single_key_always_zero() {
        let config = SimulationConfig::builder()
            .input_rate(100.0)
            .simulation_duration(1.0)
            .num_keys(1)
            .build();
        let mut rng = StdRng::seed_from_u64(7);

        assert!(ArrivalSchedule::new(&config, &mut rng).all(|arrival| arrival.key == 0));
    }

    #[test]
    fn uniform_key_distribution() {
        let num_keys = 10;
        let config = SimulationConfig::builder()
            .input_rate(1000.0)
            .simulation_duration(10.0)
            .num_keys(num_keys)
            .build();
        let mut rng = StdRng::seed_from_u64(42);

        let mut counts: HashMap<usize, usize> = HashMap::new();
        for arrival in ArrivalSchedule::new(&config, &mut rng) {
            *counts.entry(arrival.key).or_insert(0) += 1;
        }

        // Should see all keys, and nothing outside the range
        assert_eq!(counts.len(), num_keys);
        assert!(counts.keys().all(|key| *key < num_keys));

        let expected = config.total_arrivals() / num_keys;
        for (_, count) in counts {
            let ratio = count as f64 / expected as f64;
            // Allow 20% deviation
            assert!(ratio > 0.8 && ratio < 1.2, "Ratio: {}", ratio);
        }
    }

    #[test]
    fn reproducible_for_same_seed() {
        let config = SimulationConfig::builder()
            .input_rate(50.0)
            .simulation_duration(2.0)
            .build();

        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);

        let a: Vec<_> = ArrivalSchedule::new(&config, &mut rng1).collect();
        let b: Vec<_> = ArrivalSchedule::new(&config, &mut rng2).collect();

        assert_eq!(a, b, "Same seed should produce same sequence");
    }
}
