//! Serving Error Types
//!
//! Two error families flow out of the state manager:
//! - Admission errors: surfaced to the caller verbatim, never retried.
//! - Transition errors: surfaced to the caller AND handed to the
//!   background retry loop.

use std::fmt;

use crate::subsystems::SubsystemError;

/// Result type for serving operations
pub type ServingResult<T> = Result<T, ServingError>;

/// Error returned by admission checks and transitions.
#[derive(Debug, Clone)]
pub struct ServingError {
    /// Error kind
    pub kind: ServingErrorKind,
    /// Error message
    pub message: String,
}

/// Serving error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServingErrorKind {
    /// Request arrived while the tablet is not serving
    NotServing,

    /// Request carried no target and no local marker
    NoTarget,

    /// Target keyspace does not match this tablet
    WrongKeyspace,

    /// Target shard does not match this tablet
    WrongShard,

    /// Target tablet type does not match and is not in the allow list
    WrongTabletType,

    /// A subsystem failed while executing a transition
    Transition,
}

impl ServingError {
    /// Create a new serving error.
    pub fn new(kind: ServingErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Request rejected because the tablet is not in a serving state.
    pub fn not_serving(state_name: &str) -> Self {
        Self::new(
            ServingErrorKind::NotServing,
            format!("operation not allowed in state {}", state_name),
        )
    }

    /// Request carried no target.
    pub fn no_target() -> Self {
        Self::new(ServingErrorKind::NoTarget, "No target")
    }

    /// Target keyspace mismatch.
    pub fn invalid_keyspace(got: &str, want: &str) -> Self {
        Self::new(
            ServingErrorKind::WrongKeyspace,
            format!("invalid keyspace {} does not match expected {}", got, want),
        )
    }

    /// Target shard mismatch.
    pub fn invalid_shard(got: &str, want: &str) -> Self {
        Self::new(
            ServingErrorKind::WrongShard,
            format!("invalid shard {} does not match expected {}", got, want),
        )
    }

    /// Target tablet type mismatch, not covered by the allow list.
    pub fn invalid_tablet_type(got: &str, want: &str, also_allow: &str) -> Self {
        Self::new(
            ServingErrorKind::WrongTabletType,
            format!("invalid tablet type: {}, want: {} or {}", got, want, also_allow),
        )
    }

    /// A subsystem failed during a transition.
    pub fn transition(source: &SubsystemError) -> Self {
        Self::new(ServingErrorKind::Transition, source.to_string())
    }

    /// Check if this is an admission (validation) error.
    ///
    /// Admission errors are never retried; transition errors are.
    pub fn is_admission(&self) -> bool {
        self.kind != ServingErrorKind::Transition
    }
}

impl fmt::Display for ServingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ServingError {}
