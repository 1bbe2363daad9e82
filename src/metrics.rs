use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Live counters shared by the arrival thread and the pumps.
pub struct StationMetrics {
    cars_arrived: AtomicUsize,
    cars_served: AtomicUsize,
    services_failed: AtomicUsize,
    services_in_progress: AtomicUsize,
    peak_concurrent_services: AtomicUsize,
}

impl StationMetrics {
    pub const fn new() -> Self {
        Self {
            cars_arrived: AtomicUsize::new(0),
            cars_served: AtomicUsize::new(0),
            services_failed: AtomicUsize::new(0),
            services_in_progress: AtomicUsize::new(0),
            peak_concurrent_services: AtomicUsize::new(0),
        }
    }

    pub fn on_arrival(&self) {
        self.cars_arrived.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_service_start(&self) {
        let now = self.services_in_progress.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_concurrent_services
            .fetch_max(now, Ordering::SeqCst);
    }

    pub fn on_service_end(&self) {
        self.services_in_progress.fetch_sub(1, Ordering::SeqCst);
        self.cars_served.fetch_add(1, Ordering::SeqCst);
    }

    /// Ends a service that did not complete; the car is not counted as served.
    pub fn on_service_failed(&self) {
        self.services_in_progress.fetch_sub(1, Ordering::SeqCst);
        self.services_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn cars_arrived(&self) -> usize {
        self.cars_arrived.load(Ordering::SeqCst)
    }

    pub fn cars_served(&self) -> usize {
        self.cars_served.load(Ordering::SeqCst)
    }

    pub fn services_failed(&self) -> usize {
        self.services_failed.load(Ordering::SeqCst)
    }

    pub fn services_in_progress(&self) -> usize {
        self.services_in_progress.load(Ordering::SeqCst)
    }

    pub fn peak_concurrent_services(&self) -> usize {
        self.peak_concurrent_services.load(Ordering::SeqCst)
    }
}

impl Default for StationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of one completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationReport {
    pub cars_arrived: usize,
    pub cars_served: usize,
    pub services_failed: usize,
    /// Index `i` holds the count for pump `i + 1`.
    pub served_per_pump: Vec<usize>,
    pub peak_concurrent_services: usize,
    pub elapsed: Duration,
}
