use std::sync::Arc;
use std::thread;

use crate::car::Car;
use crate::events::{EventSink, StationEvent};
use crate::metrics::StationMetrics;
use crate::queue::BoundedBlockingQueue;
use crate::traits::DurationProvider;

/// Sole producer of cars: generates a fixed number of them, spaced by the injected delay.
pub struct ArrivalStream {
    cars: usize,
    queue: Arc<BoundedBlockingQueue<Car>>,
    durations: Arc<dyn DurationProvider>,
    events: EventSink,
    metrics: Arc<StationMetrics>,
}

impl ArrivalStream {
    pub fn new(
        cars: usize,
        queue: Arc<BoundedBlockingQueue<Car>>,
        durations: Arc<dyn DurationProvider>,
        events: EventSink,
        metrics: Arc<StationMetrics>,
    ) -> Self {
        Self {
            cars,
            queue,
            durations,
            events,
            metrics,
        }
    }

    /// Enqueues cars `1..=cars` in order; blocks whenever the waiting area is full.
    pub fn run(self) -> usize {
        for id in 1..=self.cars {
            let car = Car::numbered(id);
            self.events.emit(StationEvent::Arrived {
                name: car.name().to_string(),
            });
            self.metrics.on_arrival();
            self.queue.add_car(car, &self.events);

            thread::sleep(self.durations.arrival_delay());
        }

        tracing::debug!(cars = self.cars, "arrivals finished");
        self.cars
    }
}
