//! Time-ordered event queue.
//!
//! Events are popped in ascending timestamp order. Events scheduled for the same instant come
//! out in the order they were scheduled, using a sequence number stamped at scheduling time
//! rather than relying on the heap's own (unspecified) ordering of equal elements.

use std::{cmp::Ordering, collections::BinaryHeap};

use crate::key_state::Token;

/// Simulated time, in seconds since the start of the run.
pub type Timestamp = f64;

/// What happens when an event fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum EventKind {
    /// A message arrives for the event's key.
    Arrival,
    /// A send for the event's key finishes, delivering `count` messages.
    SendComplete { count: usize },
    /// The buffer for the event's key has been open for the maximum buffering duration.
    ///
    /// Only acted on if `token` is still the key's current token.
    BufferTimeout { token: Token },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Event {
    pub(crate) at: Timestamp,
    pub(crate) key: usize,
    pub(crate) kind: EventKind,
    seq: u64,
}

/// Orders events so the heap yields the earliest (then lowest sequence number) first.
#[derive(Debug)]
struct Scheduled(Event);

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so compare the other way round.
        other
            .0
            .at
            .total_cmp(&self.0.at)
            .then_with(|| other.0.seq.cmp(&self.0.seq))
    }
}

/// Min-priority queue of events keyed by `(timestamp, sequence number)`.
#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl EventQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            next_seq: 0,
        }
    }

    pub(crate) fn schedule(&mut self, at: Timestamp, key: usize, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.heap.push(Scheduled(Event { at, key, kind, seq }));
    }

    pub(crate) fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|scheduled| scheduled.0)
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
