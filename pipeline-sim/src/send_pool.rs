use std::collections::VecDeque;

use crate::{error::InvariantViolation, event::Timestamp};

/// A batch that has left its key's buffer but is waiting for a send slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PendingBatch {
    pub(crate) key: usize,
    pub(crate) count: usize,
    pub(crate) ready_at: Timestamp,
}

/// Bounded pool of send slots, plus the FIFO of batches waiting for one.
///
/// Batches are only promoted from the waiting queue when a send completes.
#[derive(Debug)]
pub(crate) struct SendPool {
    capacity: usize,
    active: usize,
    peak_active: usize,
    waiting: VecDeque<PendingBatch>,
}

impl SendPool {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            active: 0,
            peak_active: 0,
            waiting: VecDeque::new(),
        }
    }

    pub(crate) fn has_free_slot(&self) -> bool {
        self.active < self.capacity
    }

    /// Occupy a slot.
    pub(crate) fn acquire(&mut self) -> Result<(), InvariantViolation> {
        if !self.has_free_slot() {
            return Err(InvariantViolation::SlotOverflow {
                capacity: self.capacity,
            });
        }

        self.active += 1;
        self.peak_active = self.peak_active.max(self.active);
        Ok(())
    }

    /// Free a slot after a send completes.
    pub(crate) fn release(&mut self) -> Result<(), InvariantViolation> {
        self.active = self
            .active
            .checked_sub(1)
            .ok_or(InvariantViolation::SlotUnderflow)?;
        Ok(())
    }

    pub(crate) fn enqueue(&mut self, batch: PendingBatch) {
        self.waiting.push_back(batch);
    }

    /// Take the oldest waiting batch, if a slot is free for it.
    pub(crate) fn next_waiting(&mut self) -> Option<PendingBatch> {
        if self.has_free_slot() {
            self.waiting.pop_front()
        } else {
            None
        }
    }

    pub(crate) fn active(&self) -> usize {
        self.active
    }

    pub(crate) fn peak_active(&self) -> usize {
        self.peak_active
    }

    /// Messages sitting in the waiting queue.
    pub(crate) fn waiting_messages(&self) -> usize {
        self.waiting.iter().map(|batch| batch.count).sum()
    }

    #[cfg(test)]
    pub(crate) fn waiting_len(&self) -> usize {
        self.waiting.len()
    }
}
