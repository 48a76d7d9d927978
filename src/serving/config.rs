//! Serving configuration
//!
//! Timing knobs for the state manager. Parsing and file formats are an
//! outer-layer concern; the manager takes a plain struct.

use std::time::Duration;

/// Configuration for the serving state manager.
#[derive(Debug, Clone)]
pub struct ServingConfig {
    /// Gap between attempts of the background transition retry loop.
    pub transition_retry_interval: Duration,

    /// Upper bound on how long shutdown waits for in-flight requests
    /// before forcefully proceeding. Zero waits without bound.
    pub shutdown_grace_period: Duration,

    /// Number of transition records kept in the in-memory history.
    pub history_capacity: usize,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            transition_retry_interval: Duration::from_secs(30),
            shutdown_grace_period: Duration::from_secs(30),
            history_capacity: 10,
        }
    }
}
