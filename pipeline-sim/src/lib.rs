//! Simulate a keyed batching pipeline against a sliding-window request ceiling.
//!
//! Messages arrive at a steady rate, each for one of several keys. Each key buffers its messages
//! until either a full batch has accumulated or the oldest buffered message has waited long
//! enough. Ready batches are sent to a downstream API through a bounded pool of concurrent send
//! slots, queueing in FIFO order when every slot is busy.
//!
//! The downstream API tolerates at most a certain number of requests in any window of time. A
//! simulation run reports the busiest window it saw, so a configuration can be checked against
//! that ceiling without hitting a real API.
//!
//! Runs are deterministic: the same config and seed always produce the same result.
//!
//! See the README for an example.

#![deny(missing_docs)]

#[cfg(doctest)]
use doc_comment::doctest;
#[cfg(doctest)]
doctest!("../../README.md");

mod arrival;
mod config;
mod engine;
pub mod error;
mod event;
mod key_state;
mod latency;
pub mod metrics;
mod result;
mod send_pool;

pub use config::SimulationConfig;
pub use engine::{run, Simulation, DRAIN_ALLOWANCE};
pub use error::{ConfigError, InvariantViolation, SimulationError};
pub use event::Timestamp;
pub use metrics::{Delivery, DeliveryLog, WindowStats};
pub use result::SimulationResult;

#[cfg(test)]
mod tests {
    use tracing::Level;
    use tracing_capture::{CaptureLayer, SharedStorage};
    use tracing_subscriber::layer::SubscriberExt;

    use crate::{run, SimulationConfig};

    #[test]
    fn test_tracing() {
        let subscriber = tracing_subscriber::fmt()
            .pretty()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .finish();
        // Add the capturing layer.
        let storage = SharedStorage::default();
        let subscriber = subscriber.with(CaptureLayer::new(&storage));

        let _guard = tracing::subscriber::set_default(subscriber);

        let config = SimulationConfig::builder()
            .input_rate(100.0)
            .simulation_duration(2.0)
            .build();

        run(&config, 42).unwrap();

        let storage = storage.lock();

        let simulation_spans: Vec<_> = storage
            .all_spans()
            .filter(|span| span.metadata().name() == "simulation")
            .collect();
        assert_eq!(
            simulation_spans.len(),
            1,
            "should be a single span for the whole run"
        );
        let span = simulation_spans.first().unwrap();

        assert_eq!(span["sim.seed"], 42u64, "seed shouldn't be emitted as a string");
        assert_eq!(span["sim.arrivals"], 200u64);
    }
}
