use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tokio_util::sync::CancellationToken;

use crate::errors::{Result, StationError};

/// How often a cancellable acquire re-checks its token while parked.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Counting semaphore built from a mutex-protected permit count and a condition variable.
///
/// Clones are handles to the same permit count.
#[derive(Clone)]
pub struct CountingSemaphore {
    state: Arc<SemaphoreState>,
}

struct SemaphoreState {
    permits: Mutex<usize>,
    condition: Condvar,
}

/// Holds one permit and gives it back when dropped.
#[must_use = "the permit is released as soon as the guard is dropped"]
pub struct SemaphoreGuard {
    state: Arc<SemaphoreState>,
}

impl CountingSemaphore {
    pub fn new(initial: i64) -> Result<Self> {
        let permits = usize::try_from(initial).map_err(|_| {
            StationError::invalid(
                "semaphore permits",
                format!("cannot be negative (got {initial})"),
            )
        })?;

        Ok(Self {
            state: Arc::new(SemaphoreState {
                permits: Mutex::new(permits),
                condition: Condvar::new(),
            }),
        })
    }

    /// Blocks until a permit is available, then takes it.
    pub fn acquire(&self) {
        let mut permits = self.state.permits.lock();
        self.state.condition.wait_while(&mut permits, |p| *p == 0);
        *permits -= 1;
    }

    pub fn acquire_permit(&self) -> SemaphoreGuard {
        self.acquire();
        SemaphoreGuard {
            state: Arc::clone(&self.state),
        }
    }

    /// A guard that releases one permit when dropped, without acquiring one first.
    ///
    /// Used to signal a semaphore on every exit path of a section, including unwinding.
    pub fn release_on_drop(&self) -> SemaphoreGuard {
        SemaphoreGuard {
            state: Arc::clone(&self.state),
        }
    }

    pub fn try_acquire(&self) -> bool {
        let mut permits = self.state.permits.lock();
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    /// Like [`acquire`](Self::acquire), but returns `false` without taking a permit once
    /// `token` is cancelled.
    pub fn acquire_or_cancel(&self, token: &CancellationToken) -> bool {
        let mut permits = self.state.permits.lock();
        loop {
            if *permits > 0 {
                *permits -= 1;
                return true;
            }
            if token.is_cancelled() {
                return false;
            }
            self.state
                .condition
                .wait_for(&mut permits, CANCEL_POLL_INTERVAL);
        }
    }

    pub fn release(&self) {
        self.state.release();
    }

    /// Advisory snapshot; may be stale by the time the caller looks at it.
    pub fn available_permits(&self) -> usize {
        *self.state.permits.lock()
    }
}

impl SemaphoreState {
    fn release(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        self.condition.notify_one();
    }
}

impl Drop for SemaphoreGuard {
    fn drop(&mut self) {
        self.state.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_negative_permits_rejected() {
        let err = CountingSemaphore::new(-1).err().unwrap();
        assert!(err.is_invalid_configuration());
    }

    #[test]
    fn test_zero_permits_allowed() -> Result<()> {
        let sem = CountingSemaphore::new(0)?;
        assert_eq!(sem.available_permits(), 0);
        assert!(!sem.try_acquire());
        Ok(())
    }

    #[test]
    fn test_acquire_release_counts() -> Result<()> {
        let sem = CountingSemaphore::new(2)?;
        sem.acquire();
        assert_eq!(sem.available_permits(), 1);
        sem.acquire();
        assert_eq!(sem.available_permits(), 0);
        sem.release();
        assert_eq!(sem.available_permits(), 1);
        sem.release();
        assert_eq!(sem.available_permits(), 2);
        Ok(())
    }

    #[test]
    fn test_guard_releases_on_drop() -> Result<()> {
        let sem = CountingSemaphore::new(1)?;
        {
            let _guard = sem.acquire_permit();
            assert_eq!(sem.available_permits(), 0);
        }
        assert_eq!(sem.available_permits(), 1);
        Ok(())
    }

    #[test]
    fn test_release_on_drop_adds_a_permit() -> Result<()> {
        let sem = CountingSemaphore::new(0)?;
        {
            let _signal = sem.release_on_drop();
            assert_eq!(sem.available_permits(), 0);
        }
        assert_eq!(sem.available_permits(), 1);
        Ok(())
    }

    #[test]
    fn test_guard_releases_on_panic() -> Result<()> {
        let sem = CountingSemaphore::new(1)?;
        let cloned = sem.clone();
        let result = thread::spawn(move || {
            let _guard = cloned.acquire_permit();
            panic!("service step failed");
        })
        .join();

        assert!(result.is_err());
        assert_eq!(sem.available_permits(), 1);
        Ok(())
    }

    #[test]
    fn test_acquire_blocks_until_release() -> Result<()> {
        let sem = CountingSemaphore::new(0)?;
        let acquired = AtomicBool::new(false);

        thread::scope(|s| {
            s.spawn(|| {
                sem.acquire();
                acquired.store(true, Ordering::SeqCst);
            });

            thread::sleep(Duration::from_millis(50));
            assert!(!acquired.load(Ordering::SeqCst));
            sem.release();
        });

        assert!(acquired.load(Ordering::SeqCst));
        assert_eq!(sem.available_permits(), 0);
        Ok(())
    }

    #[test]
    fn test_every_release_wakes_a_waiter() -> Result<()> {
        let sem = CountingSemaphore::new(0)?;
        let woken = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    sem.acquire();
                    woken.fetch_add(1, Ordering::SeqCst);
                });
            }
            for _ in 0..8 {
                thread::sleep(Duration::from_millis(2));
                sem.release();
            }
        });

        assert_eq!(woken.load(Ordering::SeqCst), 8);
        assert_eq!(sem.available_permits(), 0);
        Ok(())
    }

    #[test]
    fn test_limits_concurrency() -> Result<()> {
        let sem = CountingSemaphore::new(3)?;
        let active = AtomicUsize::new(0);
        let max_active = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..12 {
                s.spawn(|| {
                    for _ in 0..20 {
                        let _permit = sem.acquire_permit();
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        max_active.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_micros(200));
                        active.fetch_sub(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert!(max_active.load(Ordering::SeqCst) <= 3);
        assert_eq!(sem.available_permits(), 3);
        Ok(())
    }

    #[test]
    fn test_acquire_or_cancel_gives_up() -> Result<()> {
        let sem = CountingSemaphore::new(0)?;
        let token = CancellationToken::new();

        thread::scope(|s| {
            let waiter = s.spawn(|| sem.acquire_or_cancel(&token));
            thread::sleep(Duration::from_millis(20));
            token.cancel();
            assert!(!waiter.join().unwrap());
        });

        assert_eq!(sem.available_permits(), 0);
        Ok(())
    }

    #[test]
    fn test_acquire_or_cancel_prefers_available_permit() -> Result<()> {
        let sem = CountingSemaphore::new(1)?;
        let token = CancellationToken::new();
        token.cancel();

        assert!(sem.acquire_or_cancel(&token));
        assert_eq!(sem.available_permits(), 0);
        Ok(())
    }
}
