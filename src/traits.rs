use std::time::Duration;

use crate::events::StationEvent;

/// Consumer of station events.
///
/// Observers run on the single logging thread, so implementations never see two events at
/// once, but they must still be `Send + Sync` to be shared with that thread.
pub trait StationObserver: Send + Sync {
    fn on_event(&self, event: &StationEvent);
}

/// Source of the simulated timings.
///
/// Injected into the arrival loop and the pumps so that tests can pin every delay.
pub trait DurationProvider: Send + Sync {
    /// Pause between two consecutive arrivals.
    fn arrival_delay(&self) -> Duration;

    /// Time a pump spends servicing one car.
    fn service_duration(&self) -> Duration;
}
