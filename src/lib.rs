//! A bounded-capacity service station.
//!
//! Cars arrive into a fixed-size waiting area ([`BoundedBlockingQueue`]) and are drained by a
//! pool of pumps, each of which occupies one of a limited number of service bays
//! ([`ServiceBayPool`]) while it works. Both are built on [`CountingSemaphore`].

pub mod arrival;
pub mod bays;
pub mod car;
pub mod config;
pub mod drain;
pub mod errors;
pub mod events;
pub mod metrics;
pub mod queue;
pub mod semaphore;
pub mod station;
pub mod timing;
pub mod traits;
pub mod worker;

pub mod mocks;

pub use bays::{BayGuard, ServiceBayPool};
pub use car::Car;
pub use config::Config;
pub use errors::{Result, StationError};
pub use events::{EventSink, StationEvent};
pub use metrics::StationReport;
pub use queue::BoundedBlockingQueue;
pub use semaphore::{CountingSemaphore, SemaphoreGuard};
pub use station::ServiceStation;
pub use traits::*;
