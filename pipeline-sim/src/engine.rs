use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, span, trace, Level};

use crate::{
    arrival::ArrivalSchedule,
    config::SimulationConfig,
    error::{InvariantViolation, SimulationError},
    event::{Event, EventKind, EventQueue, Timestamp},
    key_state::{KeyState, OnArrival, Token},
    latency::LatencyProfile,
    metrics::{Delivery, DeliveryLog, WindowStats, WINDOW_STEP},
    result::SimulationResult,
    send_pool::{PendingBatch, SendPool},
};

/// How long past the end of the arrival timeline in-flight work is given to finish.
pub const DRAIN_ALLOWANCE: f64 = 10.0;

/// Run one simulation.
///
/// Deterministic for a given `(config, seed)` pair.
pub fn run(config: &SimulationConfig, seed: u64) -> Result<SimulationResult, SimulationError> {
    Simulation::new(config, seed)?.run()
}

/// A single discrete-event simulation of the batching pipeline.
///
/// All state is owned by this instance, so independent runs can safely happen in parallel.
///
/// Randomness comes from one seeded generator, consumed in a fixed order: every arrival's key is
/// drawn up front when the timeline is scheduled, then one latency is drawn per send, in the
/// order sends are admitted.
#[derive(Debug)]
pub struct Simulation<'a> {
    config: &'a SimulationConfig,
    seed: u64,
    rng: StdRng,
    latency: LatencyProfile,

    queue: EventQueue,
    keys: Vec<KeyState>,
    pool: SendPool,
    log: DeliveryLog,

    total_arrivals: usize,
    in_flight_messages: usize,
}

impl<'a> Simulation<'a> {
    /// Validate the config and schedule the full arrival timeline.
    ///
    /// Nothing is scheduled if the config is invalid.
    pub fn new(config: &'a SimulationConfig, seed: u64) -> Result<Self, SimulationError> {
        config.validate()?;
        let latency = LatencyProfile::new(config)?;

        let mut rng = StdRng::seed_from_u64(seed);

        let total_arrivals = config.total_arrivals();
        let mut queue = EventQueue::with_capacity(total_arrivals.saturating_add(config.num_keys));
        for arrival in ArrivalSchedule::new(config, &mut rng) {
            queue.schedule(arrival.at, arrival.key, EventKind::Arrival);
        }

        Ok(Self {
            config,
            seed,
            rng,
            latency,

            queue,
            keys: vec![KeyState::default(); config.num_keys],
            pool: SendPool::new(config.max_concurrent_sends),
            log: DeliveryLog::default(),

            total_arrivals,
            in_flight_messages: 0,
        })
    }

    /// Process events until the queue empties or the drain allowance runs out.
    pub fn run(self) -> Result<SimulationResult, SimulationError> {
        self.run_with_log().map(|(result, _)| result)
    }

    /// Like [`run()`](Self::run), also returning every completed send.
    pub fn run_with_log(mut self) -> Result<(SimulationResult, DeliveryLog), SimulationError> {
        let span = span!(
            Level::DEBUG,
            "simulation",
            sim.seed = self.seed,
            sim.arrivals = self.total_arrivals as u64,
        );
        let _guard = span.enter();

        debug!(config = %self.config, "Starting simulation");

        let cutoff = self.config.simulation_duration + DRAIN_ALLOWANCE;
        while let Some(event) = self.queue.pop() {
            if event.at > cutoff {
                debug!(
                    at = event.at,
                    unprocessed = self.queue.len() as u64 + 1,
                    "Drain allowance exceeded, stopping"
                );
                break;
            }

            self.handle(event)?;
        }

        let result = self.finish();

        debug!(
            delivered = result.total_messages_delivered as u64,
            batches = result.total_batches_sent as u64,
            pending = result.pending_messages as u64,
            max_requests_in_window = result.max_requests_in_window as u64,
            violated = result.constraint_violated,
            "Simulation finished"
        );

        Ok((result, self.log))
    }

    fn handle(&mut self, event: Event) -> Result<(), SimulationError> {
        if event.key >= self.keys.len() {
            return Err(InvariantViolation::UnknownKey {
                key: event.key,
                num_keys: self.keys.len(),
            }
            .into());
        }

        match event.kind {
            EventKind::Arrival => self.on_arrival(event.key, event.at),
            EventKind::SendComplete { count } => self.on_send_complete(event.key, count, event.at),
            EventKind::BufferTimeout { token } => self.on_timeout(event.key, token, event.at),
        }
    }

    fn on_arrival(&mut self, key: usize, now: Timestamp) -> Result<(), SimulationError> {
        if let OnArrival::Opened(token) = self.keys[key].push(now) {
            self.schedule_timeout(key, token, now);
        }

        if self.keys[key].buffered() >= self.config.batch_size {
            self.flush(key, self.config.batch_size, now)?;
        }

        Ok(())
    }

    fn on_timeout(&mut self, key: usize, token: Token, now: Timestamp) -> Result<(), SimulationError> {
        let state = &self.keys[key];

        if !state.is_live(token) {
            // Superseded by a drain since it was scheduled.
            trace!(key, at = now, "Ignoring stale buffering timeout");
            return Ok(());
        }

        let buffered = state.buffered();
        if buffered == 0 {
            return Err(InvariantViolation::LiveTimeoutOnEmptyBuffer { key }.into());
        }

        self.flush(key, buffered, now)
    }

    fn on_send_complete(
        &mut self,
        key: usize,
        count: usize,
        now: Timestamp,
    ) -> Result<(), SimulationError> {
        self.pool.release()?;
        self.in_flight_messages -= count;
        self.log.record(Delivery { at: now, key, count });

        if let Some(next) = self.pool.next_waiting() {
            trace!(
                key = next.key,
                waited = now - next.ready_at,
                "Admitting waiting batch"
            );
            self.admit(next, now)?;
        }

        Ok(())
    }

    /// Take up to `max` messages out of the key's buffer and try to send them.
    fn flush(&mut self, key: usize, max: usize, now: Timestamp) -> Result<(), SimulationError> {
        let drained = self.keys[key].drain(max, now);

        if let Some(token) = drained.reopened {
            self.schedule_timeout(key, token, now);
        }

        self.try_send(
            PendingBatch {
                key,
                count: drained.count,
                ready_at: now,
            },
            now,
        )
    }

    /// The batch has already left the buffer, whether or not a slot is free.
    fn try_send(&mut self, batch: PendingBatch, now: Timestamp) -> Result<(), SimulationError> {
        if self.pool.has_free_slot() {
            self.admit(batch, now)
        } else {
            trace!(
                key = batch.key,
                count = batch.count as u64,
                "All send slots busy, queueing batch"
            );
            self.pool.enqueue(batch);
            Ok(())
        }
    }

    fn admit(&mut self, batch: PendingBatch, now: Timestamp) -> Result<(), SimulationError> {
        self.pool.acquire()?;

        let duration = self.latency.sample(&mut self.rng);
        self.in_flight_messages += batch.count;
        self.queue.schedule(
            now + duration,
            batch.key,
            EventKind::SendComplete { count: batch.count },
        );

        debug_assert!(self.pool.active() <= self.config.max_concurrent_sends);

        Ok(())
    }

    fn schedule_timeout(&mut self, key: usize, token: Token, now: Timestamp) {
        self.queue.schedule(
            now + self.config.max_buffering_duration,
            key,
            EventKind::BufferTimeout { token },
        );
    }

    fn finish(&self) -> SimulationResult {
        let buffered: usize = self.keys.iter().map(KeyState::buffered).sum();
        let pending_messages = buffered + self.pool.waiting_messages();

        let base = SimulationResult {
            pending_messages,
            total_arrivals: self.total_arrivals,
            in_flight_messages: self.in_flight_messages,
            peak_active_sends: self.pool.peak_active(),
            ..SimulationResult::default()
        };

        let Some(last_delivery) = self.log.last_delivery_time() else {
            return base;
        };

        let window = WindowStats::sliding(&self.log.timestamps(), self.config.window_size, WINDOW_STEP);

        let delivered = self.log.total_messages();
        let effective_duration = last_delivery.min(self.config.simulation_duration);
        let throughput = if effective_duration > 0.0 {
            delivered as f64 / effective_duration
        } else {
            0.0
        };

        SimulationResult {
            max_requests_in_window: window.max,
            avg_requests_in_window: window.mean,
            total_messages_delivered: delivered,
            total_batches_sent: self.log.total_batches(),
            throughput,
            constraint_violated: window.max >= self.config.window_max_requests,
            ..base
        }
    }
}
