use pipeline_sim::{Simulation, SimulationConfig};
use proptest::prelude::*;

fn arb_config() -> impl Strategy<Value = SimulationConfig> {
    (
        (1.0..200.0f64, 0.1..5.0f64),
        (1usize..8, 1usize..20, 1usize..4),
        (0.05..3.0f64, 0.0..1.0f64, 0.0..1.0f64, 0.0..0.2f64),
        (0.5..5.0f64, 1usize..50),
    )
        .prop_map(
            |(
                (input_rate, simulation_duration),
                (num_keys, batch_size, max_concurrent_sends),
                (max_buffering_duration, latency_a, latency_b, send_sleep),
                (window_size, window_max_requests),
            )| {
                SimulationConfig::builder()
                    .input_rate(input_rate)
                    .simulation_duration(simulation_duration)
                    .num_keys(num_keys)
                    .batch_size(batch_size)
                    .max_concurrent_sends(max_concurrent_sends)
                    .max_buffering_duration(max_buffering_duration)
                    .api_latency_min(latency_a.min(latency_b))
                    .api_latency_max(latency_a.max(latency_b))
                    .send_sleep(send_sleep)
                    .window_size(window_size)
                    .window_max_requests(window_max_requests)
                    .build()
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn every_arrival_is_accounted_for(config in arb_config(), seed in any::<u64>()) {
        let (result, log) = Simulation::new(&config, seed).unwrap().run_with_log().unwrap();

        prop_assert!(result.is_conserved(), "{:?}", result);
        prop_assert_eq!(result.total_arrivals, config.total_arrivals());
        prop_assert_eq!(result.total_batches_sent, log.deliveries().len());
    }

    #[test]
    fn concurrency_never_exceeds_capacity(config in arb_config(), seed in any::<u64>()) {
        let result = Simulation::new(&config, seed).unwrap().run().unwrap();

        prop_assert!(result.peak_active_sends <= config.max_concurrent_sends);
    }

    #[test]
    fn batches_are_never_empty_or_oversized(config in arb_config(), seed in any::<u64>()) {
        let (_, log) = Simulation::new(&config, seed).unwrap().run_with_log().unwrap();

        for delivery in log.deliveries() {
            prop_assert!(delivery.count >= 1);
            prop_assert!(delivery.count <= config.batch_size);
            prop_assert!(delivery.key < config.num_keys);
        }
        prop_assert!(log.deliveries().windows(2).all(|pair| pair[0].at <= pair[1].at));
    }

    #[test]
    fn violation_matches_the_busiest_window(config in arb_config(), seed in any::<u64>()) {
        let result = Simulation::new(&config, seed).unwrap().run().unwrap();

        prop_assert_eq!(
            result.constraint_violated,
            result.max_requests_in_window >= config.window_max_requests
        );
        prop_assert!(result.max_requests_in_window <= result.total_batches_sent);
        prop_assert!(result.avg_requests_in_window <= result.max_requests_in_window as f64);
    }
}
