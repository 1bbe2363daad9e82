use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::events::StationEvent;
use crate::traits::{DurationProvider, StationObserver};

/// Test durations that never vary.
#[derive(Debug, Clone, Copy)]
pub struct FixedDurations {
    pub arrival: Duration,
    pub service: Duration,
}

impl FixedDurations {
    pub const fn new(arrival: Duration, service: Duration) -> Self {
        Self { arrival, service }
    }

    pub const fn zero() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub const fn millis(arrival_ms: u64, service_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(arrival_ms),
            Duration::from_millis(service_ms),
        )
    }
}

impl DurationProvider for FixedDurations {
    fn arrival_delay(&self) -> Duration {
        self.arrival
    }

    fn service_duration(&self) -> Duration {
        self.service
    }
}

/// Panics in the first `failures` service steps, then behaves like `inner`.
#[derive(Debug)]
pub struct FailingDurations {
    failures_left: AtomicUsize,
    inner: FixedDurations,
}

impl FailingDurations {
    pub const fn new(failures: usize, inner: FixedDurations) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
            inner,
        }
    }
}

impl DurationProvider for FailingDurations {
    fn arrival_delay(&self) -> Duration {
        self.inner.arrival_delay()
    }

    fn service_duration(&self) -> Duration {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            panic!("service step failed");
        }
        self.inner.service_duration()
    }
}

/// Keeps every event it sees, in delivery order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<StationEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StationEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&StationEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|&e| predicate(e)).count()
    }
}

impl StationObserver for RecordingObserver {
    fn on_event(&self, event: &StationEvent) {
        self.events.lock().push(event.clone());
    }
}
