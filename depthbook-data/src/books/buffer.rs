use super::DepthUpdate;
use std::collections::VecDeque;
use tracing::debug;

/// Bounded FIFO of [`DepthUpdate`]s awaiting the next flush.
///
/// On overflow the oldest updates are discarded so ingestion never blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBuffer {
    capacity: usize,
    updates: VecDeque<DepthUpdate>,
}

impl UpdateBuffer {
    /// Construct a new empty [`UpdateBuffer`] holding at most `capacity` updates.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            updates: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Append an update, returning how many of the oldest updates were evicted to make room.
    pub fn enqueue(&mut self, update: DepthUpdate) -> usize {
        self.updates.push_back(update);

        let evicted = self.updates.len().saturating_sub(self.capacity);
        if evicted > 0 {
            for _ in 0..evicted {
                self.updates.pop_front();
            }
            debug!(
                evicted,
                capacity = self.capacity,
                "pending update buffer full, dropped oldest updates"
            );
        }

        evicted
    }

    /// Remove and return every queued update in arrival order.
    pub fn drain_all(&mut self) -> Vec<DepthUpdate> {
        self.updates.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.updates.clear();
    }
}
