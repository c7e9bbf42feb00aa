//! Delivery recording and sliding-window analysis

use crate::event::Timestamp;

/// Step between consecutive window start times.
pub const WINDOW_STEP: f64 = 0.1;

/// A completed send.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delivery {
    /// When the send completed.
    pub at: Timestamp,
    /// The key the batch belonged to.
    pub key: usize,
    /// Messages in the batch.
    pub count: usize,
}

/// Append-only record of completed sends, in completion order.
#[derive(Debug, Default)]
pub struct DeliveryLog {
    deliveries: Vec<Delivery>,
    total_messages: usize,
}

impl DeliveryLog {
    /// Record a completed send.
    ///
    /// Completions are recorded as events are processed, so timestamps never go backwards.
    pub fn record(&mut self, delivery: Delivery) {
        debug_assert!(
            self.last_delivery_time()
                .is_none_or(|last| last <= delivery.at),
            "deliveries should be recorded in time order"
        );

        self.total_messages += delivery.count;
        self.deliveries.push(delivery);
    }

    /// All deliveries so far.
    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    /// Number of completed sends.
    pub fn total_batches(&self) -> usize {
        self.deliveries.len()
    }

    /// Number of messages delivered.
    pub fn total_messages(&self) -> usize {
        self.total_messages
    }

    /// Timestamp of the most recent delivery.
    pub fn last_delivery_time(&self) -> Option<Timestamp> {
        self.deliveries.last().map(|delivery| delivery.at)
    }

    /// Completion timestamps, in order.
    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.deliveries.iter().map(|delivery| delivery.at).collect()
    }
}

/// Request counts over a sliding window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowStats {
    /// Highest number of requests seen in any sampled window.
    pub max: usize,
    /// Mean number of requests across sampled windows.
    pub mean: f64,
    /// Number of windows sampled.
    pub windows: usize,
}

impl WindowStats {
    /// Slide a window of width `window_size` across sorted `timestamps`.
    ///
    /// Window starts are `k * step` for `k = 0, 1, ...` up to and including the last timestamp.
    /// Each window `[start, start + window_size)` counts one request per timestamp inside it.
    ///
    /// Returns the default (all zero) stats for an empty timeline.
    pub fn sliding(timestamps: &[Timestamp], window_size: f64, step: f64) -> Self {
        let Some(&last) = timestamps.last() else {
            return Self::default();
        };

        // Divide rather than multiply: 29.0 / 10.0 is exactly 2.9, 29.0 * 0.1 is not.
        let steps_per_second = step.recip();

        let mut max = 0;
        let mut total = 0;
        let mut windows = 0;

        loop {
            let start = windows as f64 / steps_per_second;
            if start > last {
                break;
            }

            let count = count_in_range(timestamps, start, start + window_size);
            max = max.max(count);
            total += count;
            windows += 1;
        }

        Self {
            max,
            mean: total as f64 / windows as f64,
            windows,
        }
    }
}

/// Count sorted timestamps in `[start, end)`.
fn count_in_range(sorted: &[Timestamp], start: f64, end: f64) -> usize {
    let lower = sorted.partition_point(|&t| t < start);
    let upper = sorted.partition_point(|&t| t < end);
    upper - lower
}
