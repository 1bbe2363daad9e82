use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::arrival::ArrivalStream;
use crate::bays::ServiceBayPool;
use crate::car::Car;
use crate::config::Config;
use crate::drain::DrainMonitor;
use crate::errors::{Result, StationError};
use crate::events::{EventSink, StationEvent};
use crate::metrics::{StationMetrics, StationReport};
use crate::queue::BoundedBlockingQueue;
use crate::timing::UniformDurations;
use crate::traits::{DurationProvider, StationObserver};
use crate::worker::{Pump, PumpContext};

/// Waiting area, pumps and bays wired together.
///
/// Construction validates the configuration and starts nothing. [`run`](Self::run) drives
/// one full simulation: pumps start, all cars arrive, the station drains, pumps stop.
pub struct ServiceStation {
    config: Config,
    queue: Arc<BoundedBlockingQueue<Car>>,
    bays: ServiceBayPool,
    durations: Arc<dyn DurationProvider>,
    metrics: Arc<StationMetrics>,
}

impl ServiceStation {
    pub fn new(config: Config, durations: Arc<dyn DurationProvider>) -> Result<Self> {
        config.validate()?;
        let queue = Arc::new(BoundedBlockingQueue::new(config.waiting_area()?)?);
        let bays = ServiceBayPool::new(config.pumps)?;

        Ok(Self {
            config,
            queue,
            bays,
            durations,
            metrics: Arc::new(StationMetrics::new()),
        })
    }

    /// Station with uniformly random delays drawn from the configured ranges.
    pub fn from_config(config: Config) -> Result<Self> {
        let arrival = config.arrival_range()?;
        let service = config.service_range()?;
        let durations = match config.seed {
            Some(seed) => UniformDurations::seeded(arrival, service, seed),
            None => UniformDurations::new(arrival, service),
        };
        Self::new(config, Arc::new(durations))
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Advisory number of cars in the waiting area.
    pub fn waiting_count(&self) -> usize {
        self.queue.waiting_count()
    }

    /// Advisory number of free bays.
    pub fn available_bays(&self) -> usize {
        self.bays.available_bays()
    }

    pub fn metrics(&self) -> &StationMetrics {
        &self.metrics
    }

    /// Runs the simulation to completion, feeding every event to `observer`.
    ///
    /// Counters in the returned report accumulate over the station's lifetime.
    pub fn run(&self, observer: Arc<dyn StationObserver>) -> Result<StationReport> {
        let started = Instant::now();
        let (events, receiver) = EventSink::channel();
        let logger = receiver.spawn_logger(observer)?;

        let cancellation_token = CancellationToken::new();
        // Stops the pumps on every early return below.
        let _stop_pumps = cancellation_token.clone().drop_guard();

        let context = PumpContext {
            queue: Arc::clone(&self.queue),
            bays: self.bays.clone(),
            durations: Arc::clone(&self.durations),
            events: events.clone(),
            metrics: Arc::clone(&self.metrics),
            cancellation_token: cancellation_token.clone(),
        };

        let mut pumps = Vec::with_capacity(self.config.pumps);
        for id in 1..=self.config.pumps {
            let pump = Pump::new(id, context.clone());
            pumps.push(NamedThread::spawn(format!("pump-{id}"), move || pump.run())?);
        }
        drop(context);

        let arrivals = ArrivalStream::new(
            self.config.cars,
            Arc::clone(&self.queue),
            Arc::clone(&self.durations),
            events.clone(),
            Arc::clone(&self.metrics),
        );
        let arrived = NamedThread::spawn("arrivals".to_string(), move || arrivals.run())?.join()?;
        tracing::debug!(arrived, "all cars generated, watching for drain");

        let monitor = DrainMonitor::new(
            Arc::clone(&self.queue),
            self.bays.clone(),
            self.config.poll_interval(),
        );
        // A pump only ends on its own by panicking; its join below reports it.
        monitor.wait_unless(|| pumps.iter().any(NamedThread::is_finished));
        if monitor.is_drained() {
            events.emit(StationEvent::Drained);
        } else {
            tracing::warn!("a pump exited before the station drained");
        }

        cancellation_token.cancel();
        let served_per_pump = pumps
            .into_iter()
            .map(NamedThread::join)
            .collect::<Result<Vec<_>>>()?;

        drop(events);
        logger.finish()?;

        Ok(StationReport {
            cars_arrived: self.metrics.cars_arrived(),
            cars_served: self.metrics.cars_served(),
            services_failed: self.metrics.services_failed(),
            served_per_pump,
            peak_concurrent_services: self.metrics.peak_concurrent_services(),
            elapsed: started.elapsed(),
        })
    }
}

struct NamedThread<T> {
    name: String,
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> NamedThread<T> {
    fn spawn<F>(name: String, f: F) -> Result<Self>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(f)
            .map_err(|source| StationError::ThreadSpawn {
                name: name.clone(),
                source,
            })?;
        Ok(Self { name, handle })
    }

    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    fn join(self) -> Result<T> {
        self.handle
            .join()
            .map_err(|_| StationError::ThreadPanicked { name: self.name })
    }
}
