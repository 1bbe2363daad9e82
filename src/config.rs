use clap::Parser;
use std::time::Duration;

use crate::errors::{Result, StationError};
use crate::timing::DelayRange;

/// Largest waiting area the station accepts.
pub const MAX_WAITING_AREA: usize = 10;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Number of cars the waiting area holds (1-10)
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=MAX_WAITING_AREA as u64))]
    pub capacity: u64,

    /// Number of pumps, each with its own service bay
    #[arg(short, long, default_value_t = 3)]
    pub pumps: usize,

    /// Total number of cars to generate
    #[arg(short = 'n', long, default_value_t = 10)]
    pub cars: usize,

    #[arg(long, default_value_t = 1000)]
    pub arrival_min_ms: u64,

    #[arg(long, default_value_t = 2000)]
    pub arrival_max_ms: u64,

    #[arg(long, default_value_t = 2000)]
    pub service_min_ms: u64,

    #[arg(long, default_value_t = 6000)]
    pub service_max_ms: u64,

    /// How often the drain monitor samples the station
    #[arg(long, default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Seed for reproducible delays
    #[arg(long)]
    pub seed: Option<u64>,

    /// Show a progress bar instead of plain log lines
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 5,
            pumps: 3,
            cars: 10,
            arrival_min_ms: 1000,
            arrival_max_ms: 2000,
            service_min_ms: 2000,
            service_max_ms: 6000,
            poll_interval_ms: 1000,
            seed: None,
            progress: false,
        }
    }
}

impl Config {
    /// Checks everything the station would reject, before any thread starts.
    pub fn validate(&self) -> Result<()> {
        if self.capacity < 1 || self.capacity > MAX_WAITING_AREA as u64 {
            return Err(StationError::invalid(
                "capacity",
                format!("must be between 1 and {MAX_WAITING_AREA} (got {})", self.capacity),
            ));
        }
        if self.pumps < 1 {
            return Err(StationError::invalid("pumps", "must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(StationError::invalid("poll interval", "must be positive"));
        }
        self.arrival_range()?;
        self.service_range()?;
        Ok(())
    }

    pub fn waiting_area(&self) -> Result<usize> {
        usize::try_from(self.capacity)
            .map_err(|_| StationError::invalid("capacity", "does not fit in memory"))
    }

    pub fn arrival_range(&self) -> Result<DelayRange> {
        DelayRange::new(self.arrival_min_ms, self.arrival_max_ms)
    }

    pub fn service_range(&self) -> Result<DelayRange> {
        DelayRange::new(self.service_min_ms, self.service_max_ms)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
