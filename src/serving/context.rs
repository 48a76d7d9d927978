//! Request Context
//!
//! Context carried alongside every request that reaches the admission
//! gate. Server-internal queries (schema reloads, heartbeats) are
//! marked as local and bypass admission entirely; they must be able to
//! run in every lifecycle state.

use std::time::Instant;
use uuid::Uuid;

/// Where a request originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOrigin {
    /// A client request arriving over the query service.
    Client,
    /// A server-internal request; bypasses admission checks.
    Local,
}

/// Context carried through request admission.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for log correlation.
    pub request_id: Uuid,

    /// Origin of the request.
    pub origin: RequestOrigin,

    /// Start time for duration tracking.
    started_at: Instant,
}

impl RequestContext {
    /// Create a context for a client request.
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            origin: RequestOrigin::Client,
            started_at: Instant::now(),
        }
    }

    /// Create a context for a server-internal request.
    pub fn local() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            origin: RequestOrigin::Local,
            started_at: Instant::now(),
        }
    }

    /// Check if admission should be bypassed.
    pub fn is_local(&self) -> bool {
        self.origin == RequestOrigin::Local
    }

    /// Get elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
