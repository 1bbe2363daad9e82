use crate::errors::{Result, StationError};
use crate::semaphore::{CountingSemaphore, SemaphoreGuard};

/// Interchangeable service bays handed out through a counting semaphore.
///
/// Permits are free bays. Bays and pumps are separate resources even though a station has
/// one bay per pump.
#[derive(Clone)]
pub struct ServiceBayPool {
    free: CountingSemaphore,
    total: usize,
}

/// An occupied bay. Dropping it frees the bay, on every exit path.
pub struct BayGuard {
    bay: usize,
    _permit: SemaphoreGuard,
}

impl ServiceBayPool {
    pub fn new(bays: usize) -> Result<Self> {
        if bays < 1 {
            return Err(StationError::invalid("bays", "must be at least 1"));
        }
        let permits =
            i64::try_from(bays).map_err(|_| StationError::invalid("bays", "is too large"))?;

        Ok(Self {
            free: CountingSemaphore::new(permits)?,
            total: bays,
        })
    }

    /// Blocks until a bay is free and occupies it under the number `bay`.
    pub fn acquire(&self, bay: usize) -> BayGuard {
        BayGuard {
            bay,
            _permit: self.free.acquire_permit(),
        }
    }

    pub fn available_bays(&self) -> usize {
        self.free.available_permits()
    }

    pub const fn total_bays(&self) -> usize {
        self.total
    }
}

impl BayGuard {
    pub const fn bay(&self) -> usize {
        self.bay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_empty_pool_rejected() {
        assert!(ServiceBayPool::new(0).is_err());
    }

    #[test]
    fn test_guard_frees_bay() -> Result<()> {
        let pool = ServiceBayPool::new(2)?;
        let guard = pool.acquire(1);
        assert_eq!(guard.bay(), 1);
        assert_eq!(pool.available_bays(), 1);
        drop(guard);
        assert_eq!(pool.available_bays(), pool.total_bays());
        Ok(())
    }

    #[test]
    fn test_bay_freed_when_service_panics() -> Result<()> {
        let pool = ServiceBayPool::new(1)?;
        let shared = pool.clone();

        let outcome = thread::spawn(move || {
            let _bay = shared.acquire(1);
            panic!("service interrupted");
        })
        .join();

        assert!(outcome.is_err());
        assert_eq!(pool.available_bays(), 1);
        Ok(())
    }

    #[test]
    fn test_no_more_services_than_bays() -> Result<()> {
        let pool = ServiceBayPool::new(2)?;
        let in_service = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        thread::scope(|s| {
            for pump in 1..=6 {
                let pool = &pool;
                let in_service = &in_service;
                let peak = &peak;
                s.spawn(move || {
                    for _ in 0..10 {
                        let _bay = pool.acquire(pump);
                        let now = in_service.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_micros(300));
                        in_service.fetch_sub(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.available_bays(), 2);
        Ok(())
    }
}
