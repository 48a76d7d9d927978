//! Counting semaphore
//!
//! Per SERVING_LIFECYCLE.md §5, the state manager serializes transitions
//! and rate-limits backend health rechecks with single-permit semaphores.
//! A permit is not tied to the acquiring thread: the health recheck
//! acquires on the caller's thread and releases on the worker thread
//! after the ensuing transition finishes.

use std::sync::{Condvar, Mutex};

/// A counting semaphore built on `Mutex` + `Condvar`.
///
/// Only the operations the state manager needs: blocking `acquire`,
/// non-blocking `try_acquire`, and `release` from any thread.
#[derive(Debug)]
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Create a semaphore holding `permits` permits.
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Block until a permit is available, then take it.
    pub fn acquire(&self) {
        let mut permits = self.permits.lock().unwrap();
        while *permits == 0 {
            permits = self.available.wait(permits).unwrap();
        }
        *permits -= 1;
    }

    /// Take a permit if one is available without blocking.
    ///
    /// Returns true if a permit was taken. A failed `try_acquire` is how
    /// observers detect that the protected section is busy.
    pub fn try_acquire(&self) -> bool {
        let mut permits = self.permits.lock().unwrap();
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    /// Return a permit and wake one waiter.
    pub fn release(&self) {
        let mut permits = self.permits.lock().unwrap();
        *permits += 1;
        self.available.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_try_acquire_exhausts_permits() {
        let sem = Semaphore::new(1);
        assert!(sem.try_acquire());
        assert!(!sem.try_acquire());
        sem.release();
        assert!(sem.try_acquire());
    }

    #[test]
    fn test_acquire_blocks_until_release() {
        let sem = Arc::new(Semaphore::new(1));
        sem.acquire();

        let sem2 = Arc::clone(&sem);
        let handle = thread::spawn(move || {
            sem2.acquire();
            sem2.release();
        });

        // The waiter cannot finish until we release.
        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());

        sem.release();
        handle.join().unwrap();
    }

    #[test]
    fn test_release_from_another_thread() {
        let sem = Arc::new(Semaphore::new(1));
        assert!(sem.try_acquire());

        let sem2 = Arc::clone(&sem);
        thread::spawn(move || sem2.release()).join().unwrap();

        assert!(sem.try_acquire());
        sem.release();
    }

    #[test]
    fn test_multiple_permits() {
        let sem = Semaphore::new(2);
        assert!(sem.try_acquire());
        assert!(sem.try_acquire());
        assert!(!sem.try_acquire());
    }
}
