use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::car::Car;
use crate::errors::{Result, StationError};
use crate::events::{EventSink, StationEvent};
use crate::semaphore::CountingSemaphore;

/// Fixed-capacity FIFO built from three counting semaphores.
///
/// `empty_slots` counts free room, `filled_slots` counts buffered items and `mutex` is a
/// binary semaphore serializing access to `items`; the inner lock is only ever taken while
/// holding the `mutex` permit, so it is never contended. Slot semaphores are always acquired
/// before `mutex` and released after it; the semaphores never leave this type so that order
/// cannot be broken from outside.
pub struct BoundedBlockingQueue<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
    empty_slots: CountingSemaphore,
    filled_slots: CountingSemaphore,
    mutex: CountingSemaphore,
}

impl<T> BoundedBlockingQueue<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < 1 {
            return Err(StationError::invalid("capacity", "must be at least 1"));
        }
        let slots = i64::try_from(capacity)
            .map_err(|_| StationError::invalid("capacity", "is too large"))?;

        Ok(Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            empty_slots: CountingSemaphore::new(slots)?,
            filled_slots: CountingSemaphore::new(0)?,
            mutex: CountingSemaphore::new(1)?,
        })
    }

    pub fn put(&self, item: T) {
        self.put_with(item, |_, _| {});
    }

    /// Appends `item`, blocking while the queue is full.
    ///
    /// `observe` runs inside the critical section with the item and the resulting length.
    /// The item is buffered before `observe` runs, so a panicking observer cannot lose it.
    pub fn put_with<F>(&self, item: T, observe: F)
    where
        F: FnOnce(&T, usize),
    {
        self.empty_slots.acquire();
        // Dropped after `with_items` has released `mutex`.
        let _filled = self.filled_slots.release_on_drop();
        self.with_items(|items| {
            items.push_back(item);
            if let Some(item) = items.back() {
                observe(item, items.len());
            }
        });
    }

    pub fn take(&self) -> T {
        self.take_with(|_, _| {})
    }

    /// Removes the oldest item, blocking while the queue is empty.
    ///
    /// `observe` runs inside the critical section with the item and the resulting length.
    pub fn take_with<F>(&self, observe: F) -> T
    where
        F: FnOnce(&T, usize),
    {
        self.filled_slots.acquire();
        self.take_filled(observe)
    }

    /// Like [`take_with`](Self::take_with), but returns `None` if `token` is cancelled before
    /// an item becomes available.
    pub fn take_or_cancel<F>(&self, token: &CancellationToken, observe: F) -> Option<T>
    where
        F: FnOnce(&T, usize),
    {
        if !self.filled_slots.acquire_or_cancel(token) {
            return None;
        }
        Some(self.take_filled(observe))
    }

    /// Advisory count of buffered items, for drain detection only.
    pub fn waiting_count(&self) -> usize {
        self.filled_slots.available_permits()
    }

    /// Advisory count of free slots.
    pub fn free_slots(&self) -> usize {
        self.empty_slots.available_permits()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    // Caller must already hold a `filled_slots` permit.
    fn take_filled<F>(&self, observe: F) -> T
    where
        F: FnOnce(&T, usize),
    {
        let _empty = self.empty_slots.release_on_drop();
        self.with_items(|items| {
            let item = items
                .pop_front()
                .expect("a filled-slot permit guarantees a buffered item");
            observe(&item, items.len());
            item
        })
    }

    fn with_items<R>(&self, f: impl FnOnce(&mut VecDeque<T>) -> R) -> R {
        let _lock = self.mutex.acquire_permit();
        let mut items = self.items.lock();
        f(&mut *items)
    }
}

impl BoundedBlockingQueue<Car> {
    /// Parks `car` in the waiting area and reports it as queued.
    pub fn add_car(&self, car: Car, events: &EventSink) {
        self.put_with(car, |car, size| {
            events.emit(StationEvent::Queued {
                name: car.name().to_string(),
                size,
            });
        });
    }

    /// Hands the oldest waiting car to pump `pump_id`.
    pub fn remove_car(&self, pump_id: usize, events: &EventSink) -> Car {
        self.take_with(|car, size| emit_dequeued(events, pump_id, car, size))
    }

    pub fn remove_car_or_cancel(
        &self,
        pump_id: usize,
        events: &EventSink,
        token: &CancellationToken,
    ) -> Option<Car> {
        self.take_or_cancel(token, |car, size| {
            emit_dequeued(events, pump_id, car, size)
        })
    }
}

fn emit_dequeued(events: &EventSink, pump_id: usize, car: &Car, size: usize) {
    events.emit(StationEvent::Dequeued {
        pump_id,
        name: car.name().to_string(),
        size,
    });
}
