//! Observable serving-lifecycle events
//!
//! Every externally visible thing the state manager does has a named
//! event. Log lines carry the event name as their first field, so
//! operators can filter on it.

use std::fmt;

/// Observable events in the tablet serving lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Transitions
    /// A transition toward a new (type, state) began.
    TransitionStarted,
    /// A transition finished and the new configuration took effect.
    TransitionCompleted,
    /// A transition failed; the retry loop takes over.
    TransitionFailed,

    // Retry loop
    /// The background retry loop started.
    RetryLoopStarted,
    /// The background retry loop converged and exited.
    RetryLoopEnded,

    // Draining
    /// Waiting for in-flight requests to finish.
    DrainStarted,
    /// The drain grace period expired with requests still in flight.
    DrainTimedOut,

    // Admission
    /// A client request failed the admission predicate.
    RequestRejected,

    // Backend health
    /// A backend reachability probe failed.
    BackendUnreachable,

    // Operational signals
    /// Lameduck raised; health checks now report not-serving.
    LameduckEntered,
    /// Lameduck cleared.
    LameduckExited,
    /// Full shutdown requested.
    ShutdownStarted,
    /// Shutdown finished; tablet is not connected.
    ShutdownCompleted,
}

impl Event {
    /// Returns the event name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::TransitionStarted => "TRANSITION_STARTED",
            Event::TransitionCompleted => "TRANSITION_COMPLETED",
            Event::TransitionFailed => "TRANSITION_FAILED",
            Event::RetryLoopStarted => "RETRY_LOOP_STARTED",
            Event::RetryLoopEnded => "RETRY_LOOP_ENDED",
            Event::DrainStarted => "DRAIN_STARTED",
            Event::DrainTimedOut => "DRAIN_TIMED_OUT",
            Event::RequestRejected => "REQUEST_REJECTED",
            Event::BackendUnreachable => "BACKEND_UNREACHABLE",
            Event::LameduckEntered => "LAMEDUCK_ENTERED",
            Event::LameduckExited => "LAMEDUCK_EXITED",
            Event::ShutdownStarted => "SHUTDOWN_STARTED",
            Event::ShutdownCompleted => "SHUTDOWN_COMPLETED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_stable() {
        assert_eq!(Event::TransitionStarted.as_str(), "TRANSITION_STARTED");
        assert_eq!(Event::TransitionCompleted.as_str(), "TRANSITION_COMPLETED");
        assert_eq!(Event::TransitionFailed.as_str(), "TRANSITION_FAILED");
        assert_eq!(Event::RetryLoopStarted.as_str(), "RETRY_LOOP_STARTED");
        assert_eq!(Event::RetryLoopEnded.as_str(), "RETRY_LOOP_ENDED");
        assert_eq!(Event::DrainStarted.as_str(), "DRAIN_STARTED");
        assert_eq!(Event::DrainTimedOut.as_str(), "DRAIN_TIMED_OUT");
        assert_eq!(Event::RequestRejected.as_str(), "REQUEST_REJECTED");
        assert_eq!(Event::BackendUnreachable.as_str(), "BACKEND_UNREACHABLE");
        assert_eq!(Event::LameduckEntered.as_str(), "LAMEDUCK_ENTERED");
        assert_eq!(Event::LameduckExited.as_str(), "LAMEDUCK_EXITED");
        assert_eq!(Event::ShutdownStarted.as_str(), "SHUTDOWN_STARTED");
        assert_eq!(Event::ShutdownCompleted.as_str(), "SHUTDOWN_COMPLETED");
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(Event::LameduckEntered.to_string(), "LAMEDUCK_ENTERED");
    }
}
