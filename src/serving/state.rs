//! Serving states
//!
//! Per SERVING_LIFECYCLE.md §2:
//! - NotConnected: no backend connection, nothing open
//! - NotServing: subsystems open for maintenance, requests refused
//! - Serving: fully open for the current role
//!
//! Externally only two names exist: load balancers see "SERVING" or
//! "NOT_SERVING"; the not-connected/not-serving distinction is internal.

use serde::Serialize;
use std::fmt;

/// Lifecycle state of the tablet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServingState {
    /// No connection to the backing store.
    NotConnected,

    /// Connected and open, but refusing client requests.
    NotServing,

    /// Fully serving for the current tablet type.
    Serving,
}

impl ServingState {
    /// Public name string as reported to health checkers.
    ///
    /// NotConnected and NotServing are indistinguishable externally.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Serving => "SERVING",
            Self::NotConnected | Self::NotServing => "NOT_SERVING",
        }
    }

    /// Check if this state serves client requests.
    pub fn is_serving(&self) -> bool {
        matches!(self, Self::Serving)
    }
}

impl Default for ServingState {
    fn default() -> Self {
        Self::NotConnected
    }
}

impl fmt::Display for ServingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_names_collapse_non_serving() {
        assert_eq!(ServingState::NotConnected.name(), "NOT_SERVING");
        assert_eq!(ServingState::NotServing.name(), "NOT_SERVING");
        assert_eq!(ServingState::Serving.name(), "SERVING");
    }

    #[test]
    fn test_only_serving_serves() {
        assert!(ServingState::Serving.is_serving());
        assert!(!ServingState::NotServing.is_serving());
        assert!(!ServingState::NotConnected.is_serving());
    }

    #[test]
    fn test_default_is_not_connected() {
        assert_eq!(ServingState::default(), ServingState::NotConnected);
    }
}
