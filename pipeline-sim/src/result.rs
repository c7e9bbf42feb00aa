/// Metrics from one simulation run.
///
/// Produced once when the run ends.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationResult {
    /// Most completed sends seen in any sampled window.
    pub max_requests_in_window: usize,
    /// Mean completed sends per sampled window.
    pub avg_requests_in_window: f64,
    /// Messages delivered by completed sends.
    pub total_messages_delivered: usize,
    /// Number of completed sends.
    pub total_batches_sent: usize,
    /// Delivered messages per second of simulated time.
    pub throughput: f64,
    /// Whether any window reached the request ceiling.
    pub constraint_violated: bool,
    /// Messages still buffered or waiting for a send slot when the run ended.
    pub pending_messages: usize,

    /// Messages that arrived during the run.
    pub total_arrivals: usize,
    /// Messages inside sends that had not completed when the run ended.
    pub in_flight_messages: usize,
    /// Highest number of sends in flight at once.
    pub peak_active_sends: usize,
}

impl SimulationResult {
    /// Every arrival is either pending, in flight or delivered.
    pub fn is_conserved(&self) -> bool {
        self.pending_messages + self.in_flight_messages + self.total_messages_delivered
            == self.total_arrivals
    }
}
