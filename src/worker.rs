use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use tokio_util::sync::CancellationToken;

use crate::bays::ServiceBayPool;
use crate::car::Car;
use crate::events::{EventSink, StationEvent};
use crate::metrics::StationMetrics;
use crate::queue::BoundedBlockingQueue;
use crate::traits::DurationProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    WaitingForClient,
    WaitingForBay,
    InService,
    Idle,
}

/// Everything a pump shares with the rest of the station.
#[derive(Clone)]
pub struct PumpContext {
    pub queue: Arc<BoundedBlockingQueue<Car>>,
    pub bays: ServiceBayPool,
    pub durations: Arc<dyn DurationProvider>,
    pub events: EventSink,
    pub metrics: Arc<StationMetrics>,
    pub cancellation_token: CancellationToken,
}

/// One service worker: takes the oldest waiting car, occupies a bay, serves, frees the bay.
///
/// The pump stops when its cancellation token fires while it has no car. A car already taken
/// from the queue is always served to the end.
pub struct Pump {
    id: usize,
    state: PumpState,
    context: PumpContext,
}

impl Pump {
    pub const fn new(id: usize, context: PumpContext) -> Self {
        Self {
            id,
            state: PumpState::Idle,
            context,
        }
    }

    pub const fn id(&self) -> usize {
        self.id
    }

    pub const fn state(&self) -> PumpState {
        self.state
    }

    /// Runs until cancelled and returns how many cars this pump served.
    pub fn run(mut self) -> usize {
        let mut served = 0;
        tracing::debug!(pump_id = self.id, "pump started");

        while !self.context.cancellation_token.is_cancelled() {
            self.transition(PumpState::WaitingForClient);
            let Some(car) = self.context.queue.remove_car_or_cancel(
                self.id,
                &self.context.events,
                &self.context.cancellation_token,
            ) else {
                break;
            };

            if self.serve(car) {
                served += 1;
            }
            self.transition(PumpState::Idle);
        }

        tracing::debug!(pump_id = self.id, served, "pump stopped");
        self.context.events.emit(StationEvent::PumpStopped {
            pump_id: self.id,
            served,
        });
        served
    }

    /// Serves `car` and reports whether the service step completed.
    ///
    /// The bay is freed on every path, including a panicking service step.
    fn serve(&mut self, car: Car) -> bool {
        self.transition(PumpState::WaitingForBay);
        let bay = self.context.bays.acquire(self.id);

        self.transition(PumpState::InService);
        self.context.events.emit(StationEvent::ServiceStarted {
            pump_id: self.id,
            name: car.name().to_string(),
            bay: bay.bay(),
        });
        self.context.metrics.on_service_start();

        let durations = &self.context.durations;
        let completed = panic::catch_unwind(AssertUnwindSafe(|| {
            thread::sleep(durations.service_duration());
        }))
        .is_ok();

        if completed {
            self.context.metrics.on_service_end();
            self.context.events.emit(StationEvent::ServiceFinished {
                pump_id: self.id,
                name: car.name().to_string(),
            });
        } else {
            tracing::warn!(pump_id = self.id, car = car.name(), "service step panicked");
            self.context.metrics.on_service_failed();
            self.context.events.emit(StationEvent::ServiceFailed {
                pump_id: self.id,
                name: car.name().to_string(),
            });
        }
        self.context.events.emit(StationEvent::BayFreed {
            pump_id: self.id,
            bay: bay.bay(),
        });
        completed
    }

    fn transition(&mut self, next: PumpState) {
        tracing::trace!(pump_id = self.id, from = ?self.state, to = ?next, "pump state");
        self.state = next;
    }
}
