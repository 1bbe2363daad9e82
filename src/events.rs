use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::errors::{Result, StationError};
use crate::traits::StationObserver;

/// Observable things that happen inside the station.
///
/// Events are emitted in the order each thread completes its operations; there is no global
/// wall-clock ordering across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationEvent {
    Arrived {
        name: String,
    },
    Queued {
        name: String,
        size: usize,
    },
    Dequeued {
        pump_id: usize,
        name: String,
        size: usize,
    },
    ServiceStarted {
        pump_id: usize,
        name: String,
        bay: usize,
    },
    ServiceFinished {
        pump_id: usize,
        name: String,
    },
    /// The service step panicked; the car is not counted as served.
    ServiceFailed {
        pump_id: usize,
        name: String,
    },
    BayFreed {
        pump_id: usize,
        bay: usize,
    },
    PumpStopped {
        pump_id: usize,
        served: usize,
    },
    Drained,
}

impl fmt::Display for StationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arrived { name } => write!(f, "{name} arrived"),
            Self::Queued { name, size } => {
                write!(f, "{name} entered the waiting queue. (Queue size: {size})")
            }
            Self::Dequeued {
                pump_id,
                name,
                size,
            } => write!(
                f,
                "Pump {pump_id}: {name} taken from queue. (Queue size: {size})"
            ),
            Self::ServiceStarted { pump_id, name, bay } => {
                write!(f, "Pump {pump_id}: {name} begins service at Bay {bay}")
            }
            Self::ServiceFinished { pump_id, name } => {
                write!(f, "Pump {pump_id}: {name} finishes service")
            }
            Self::ServiceFailed { pump_id, name } => {
                write!(f, "Pump {pump_id}: {name} service failed")
            }
            Self::BayFreed { pump_id, bay } => write!(f, "Pump {pump_id}: Bay {bay} is now free"),
            Self::PumpStopped { pump_id, served } => {
                write!(f, "Pump {pump_id} stopped after serving {served} car(s)")
            }
            Self::Drained => f.write_str("All cars serviced. Shutting down pumps."),
        }
    }
}

/// Sending half of the event channel. Cheap to clone; one per emitting thread.
#[derive(Clone)]
pub struct EventSink {
    sender: UnboundedSender<StationEvent>,
}

/// Receiving half of the event channel.
pub struct EventReceiver {
    receiver: UnboundedReceiver<StationEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, EventReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, EventReceiver { receiver })
    }

    /// Sends `event` to the logger. Events emitted after the logger went away are dropped.
    pub fn emit(&self, event: StationEvent) {
        let _ = self.sender.send(event);
    }
}

impl EventReceiver {
    /// Everything buffered right now, without blocking.
    pub fn drain_pending(&mut self) -> Vec<StationEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return events,
            }
        }
    }

    /// Starts the single logging thread that feeds every event to `observer`.
    ///
    /// The thread ends once every [`EventSink`] clone has been dropped.
    pub fn spawn_logger(mut self, observer: Arc<dyn StationObserver>) -> Result<EventLogger> {
        let name = "event-logger".to_string();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                while let Some(event) = self.receiver.blocking_recv() {
                    observer.on_event(&event);
                }
            })
            .map_err(|source| StationError::ThreadSpawn {
                name: name.clone(),
                source,
            })?;

        Ok(EventLogger { name, handle })
    }
}

pub struct EventLogger {
    name: String,
    handle: JoinHandle<()>,
}

impl EventLogger {
    /// Waits for the logger to flush. Returns only after all sinks are gone.
    pub fn finish(self) -> Result<()> {
        self.handle
            .join()
            .map_err(|_| StationError::ThreadPanicked { name: self.name })
    }
}

/// Writes every event through `tracing`.
#[derive(Debug, Default)]
pub struct LogObserver;

impl StationObserver for LogObserver {
    fn on_event(&self, event: &StationEvent) {
        match event {
            StationEvent::ServiceFailed { .. } => tracing::warn!("{event}"),
            _ => tracing::info!("{event}"),
        }
    }
}

/// Prints events above a progress bar that counts serviced cars.
pub struct ProgressObserver {
    progress_bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(total_cars: usize) -> Self {
        let progress_bar = ProgressBar::new(total_cars as u64);
        progress_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} serviced",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        Self::with_bar(progress_bar)
    }

    pub const fn with_bar(progress_bar: ProgressBar) -> Self {
        Self { progress_bar }
    }

    pub fn position(&self) -> u64 {
        self.progress_bar.position()
    }
}

impl StationObserver for ProgressObserver {
    fn on_event(&self, event: &StationEvent) {
        self.progress_bar.println(event.to_string());
        match event {
            StationEvent::ServiceFinished { .. } | StationEvent::ServiceFailed { .. } => {
                self.progress_bar.inc(1);
            }
            StationEvent::Drained => self.progress_bar.finish(),
            _ => {}
        }
    }
}
