//! Serving metrics
//!
//! Counters only, monotonic, reset on process start. Thread-safe
//! through atomics; Relaxed ordering is enough for metrics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counter registry for the serving lifecycle.
#[derive(Debug, Default)]
pub struct ServingMetrics {
    /// Transitions that began executing (no-ops excluded)
    transitions_started: AtomicU64,
    /// Transitions that completed and set a new state
    transitions_completed: AtomicU64,
    /// Transitions that failed and were handed to the retry loop
    transitions_failed: AtomicU64,
    /// Attempts made by the background retry loop
    retry_attempts: AtomicU64,
    /// Requests admitted by the gate
    requests_admitted: AtomicU64,
    /// Requests rejected by the gate
    requests_rejected: AtomicU64,
    /// Backend reachability probes run
    health_checks: AtomicU64,
    /// Backend reachability probes that failed
    health_check_failures: AtomicU64,
    /// Times lameduck was entered
    lameduck_entries: AtomicU64,
    /// Drains that hit the grace period with requests still in flight
    drain_timeouts: AtomicU64,
}

impl ServingMetrics {
    /// Create a registry with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment transitions started.
    pub fn add_transition_started(&self) {
        self.transitions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment transitions completed.
    pub fn add_transition_completed(&self) {
        self.transitions_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment transitions failed.
    pub fn add_transition_failed(&self) {
        self.transitions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment retry attempts.
    pub fn add_retry_attempt(&self) {
        self.retry_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment admitted requests.
    pub fn add_request_admitted(&self) {
        self.requests_admitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment rejected requests.
    pub fn add_request_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment health checks.
    pub fn add_health_check(&self) {
        self.health_checks.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment failed health checks.
    pub fn add_health_check_failure(&self) {
        self.health_check_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment lameduck entries.
    pub fn add_lameduck_entry(&self) {
        self.lameduck_entries.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment drain timeouts.
    pub fn add_drain_timeout(&self) {
        self.drain_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get transitions started.
    pub fn transitions_started(&self) -> u64 {
        self.transitions_started.load(Ordering::Relaxed)
    }

    /// Get transitions completed.
    pub fn transitions_completed(&self) -> u64 {
        self.transitions_completed.load(Ordering::Relaxed)
    }

    /// Get transitions failed.
    pub fn transitions_failed(&self) -> u64 {
        self.transitions_failed.load(Ordering::Relaxed)
    }

    /// Get retry attempts.
    pub fn retry_attempts(&self) -> u64 {
        self.retry_attempts.load(Ordering::Relaxed)
    }

    /// Get admitted requests.
    pub fn requests_admitted(&self) -> u64 {
        self.requests_admitted.load(Ordering::Relaxed)
    }

    /// Get rejected requests.
    pub fn requests_rejected(&self) -> u64 {
        self.requests_rejected.load(Ordering::Relaxed)
    }

    /// Get health checks run.
    pub fn health_checks(&self) -> u64 {
        self.health_checks.load(Ordering::Relaxed)
    }

    /// Get failed health checks.
    pub fn health_check_failures(&self) -> u64 {
        self.health_check_failures.load(Ordering::Relaxed)
    }

    /// Get lameduck entries.
    pub fn lameduck_entries(&self) -> u64 {
        self.lameduck_entries.load(Ordering::Relaxed)
    }

    /// Get drain timeouts.
    pub fn drain_timeouts(&self) -> u64 {
        self.drain_timeouts.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = ServingMetrics::new();
        assert_eq!(metrics.transitions_started(), 0);
        assert_eq!(metrics.requests_admitted(), 0);
        assert_eq!(metrics.health_checks(), 0);
    }

    #[test]
    fn test_counters_increment() {
        let metrics = ServingMetrics::new();
        metrics.add_transition_started();
        metrics.add_transition_started();
        metrics.add_transition_failed();
        assert_eq!(metrics.transitions_started(), 2);
        assert_eq!(metrics.transitions_failed(), 1);
        assert_eq!(metrics.transitions_completed(), 0);
    }

    #[test]
    fn test_concurrent_increments_are_exact() {
        let metrics = Arc::new(ServingMetrics::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let metrics = Arc::clone(&metrics);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    metrics.add_request_admitted();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.requests_admitted(), 8000);
    }
}
