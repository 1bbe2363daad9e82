use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::errors::{Result, StationError};
use crate::traits::DurationProvider;

/// Inclusive range of milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min_ms: u64,
    max_ms: u64,
}

impl DelayRange {
    pub fn new(min_ms: u64, max_ms: u64) -> Result<Self> {
        if min_ms > max_ms {
            return Err(StationError::invalid(
                "delay range",
                format!("minimum {min_ms} ms exceeds maximum {max_ms} ms"),
            ));
        }
        Ok(Self { min_ms, max_ms })
    }

    pub const fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }

    pub const fn min_ms(&self) -> u64 {
        self.min_ms
    }

    pub const fn max_ms(&self) -> u64 {
        self.max_ms
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.random_range(self.min_ms..=self.max_ms))
    }
}

/// Draws every delay uniformly from its range.
pub struct UniformDurations {
    arrival: DelayRange,
    service: DelayRange,
    rng: Mutex<StdRng>,
}

impl UniformDurations {
    pub fn new(arrival: DelayRange, service: DelayRange) -> Self {
        Self::with_rng(arrival, service, StdRng::from_os_rng())
    }

    /// Reproducible sequence of delays.
    pub fn seeded(arrival: DelayRange, service: DelayRange, seed: u64) -> Self {
        Self::with_rng(arrival, service, StdRng::seed_from_u64(seed))
    }

    fn with_rng(arrival: DelayRange, service: DelayRange, rng: StdRng) -> Self {
        Self {
            arrival,
            service,
            rng: Mutex::new(rng),
        }
    }
}

impl DurationProvider for UniformDurations {
    fn arrival_delay(&self) -> Duration {
        self.arrival.sample(&mut *self.rng.lock())
    }

    fn service_duration(&self) -> Duration {
        self.service.sample(&mut *self.rng.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_range_rejected() {
        assert!(DelayRange::new(10, 5).is_err());
        assert!(DelayRange::new(5, 5).is_ok());
    }

    #[test]
    fn test_samples_stay_in_range() -> Result<()> {
        let durations =
            UniformDurations::new(DelayRange::new(10, 20)?, DelayRange::new(100, 150)?);

        for _ in 0..200 {
            let arrival = durations.arrival_delay();
            let service = durations.service_duration();
            assert!((10..=20).contains(&arrival.as_millis()));
            assert!((100..=150).contains(&service.as_millis()));
        }
        Ok(())
    }

    #[test]
    fn test_fixed_range_is_constant() {
        let durations = UniformDurations::new(DelayRange::fixed(0), DelayRange::fixed(7));
        assert_eq!(durations.arrival_delay(), Duration::ZERO);
        assert_eq!(durations.service_duration(), Duration::from_millis(7));
    }

    #[test]
    fn test_seeded_is_reproducible() -> Result<()> {
        let arrival = DelayRange::new(0, 1000)?;
        let service = DelayRange::new(0, 1000)?;
        let first = UniformDurations::seeded(arrival, service, 42);
        let second = UniformDurations::seeded(arrival, service, 42);

        for _ in 0..20 {
            assert_eq!(first.arrival_delay(), second.arrival_delay());
            assert_eq!(first.service_duration(), second.service_duration());
        }
        Ok(())
    }
}
