use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::bays::ServiceBayPool;
use crate::car::Car;
use crate::queue::BoundedBlockingQueue;

/// Polls the queue and the bay pool until nothing is waiting and every bay is free.
///
/// Only meaningful once no more arrivals can happen: the end state is then stable, so one
/// favorable sample is enough.
pub struct DrainMonitor {
    queue: Arc<BoundedBlockingQueue<Car>>,
    bays: ServiceBayPool,
    poll_interval: Duration,
}

impl DrainMonitor {
    pub const fn new(
        queue: Arc<BoundedBlockingQueue<Car>>,
        bays: ServiceBayPool,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            bays,
            poll_interval,
        }
    }

    pub fn is_drained(&self) -> bool {
        self.queue.waiting_count() == 0 && self.bays.available_bays() == self.bays.total_bays()
    }

    /// Blocks until drained; returns the number of polls it took.
    pub fn wait(&self) -> usize {
        self.wait_unless(|| false)
    }

    /// Like [`wait`](Self::wait), but stops early once `give_up` returns `true`.
    pub fn wait_unless(&self, mut give_up: impl FnMut() -> bool) -> usize {
        let mut polls = 1;
        while !self.is_drained() && !give_up() {
            tracing::debug!(
                waiting = self.queue.waiting_count(),
                free_bays = self.bays.available_bays(),
                "station still busy"
            );
            thread::sleep(self.poll_interval);
            polls += 1;
        }
        polls
    }
}
