//! # Subsystem Errors
//!
//! Error type returned by fallible subsystem lifecycle operations.

use thiserror::Error;

/// Result type for fallible subsystem operations
pub type SubsystemResult = Result<(), SubsystemError>;

/// Errors surfaced by subsystem `open`/`accept` calls and the backend
/// reachability probe.
///
/// `close()` is infallible by contract: a subsystem that can fail
/// internally while closing must log and swallow the failure itself, so
/// the state manager can always reach the not-connected state.
#[derive(Debug, Clone, Error)]
pub enum SubsystemError {
    /// The subsystem could not open or re-open its resources
    #[error("{subsystem} failed to open: {message}")]
    OpenFailed {
        /// Name of the failing subsystem
        subsystem: &'static str,
        /// Backend-provided detail
        message: String,
    },

    /// The backing store did not respond to a reachability probe
    #[error("backend unreachable: {0}")]
    BackendUnreachable(String),

    /// The transaction engine refused to enter the requested mode
    #[error("transaction engine rejected {mode} mode: {message}")]
    ModeRejected {
        /// "read-write" or "read-only"
        mode: &'static str,
        /// Engine-provided detail
        message: String,
    },
}

impl SubsystemError {
    /// Create an open failure for the named subsystem.
    pub fn open_failed(subsystem: &'static str, message: impl Into<String>) -> Self {
        Self::OpenFailed {
            subsystem,
            message: message.into(),
        }
    }

    /// Create a backend unreachable error.
    pub fn backend_unreachable(message: impl Into<String>) -> Self {
        Self::BackendUnreachable(message.into())
    }

    /// Create a mode rejection from the transaction engine.
    pub fn mode_rejected(mode: &'static str, message: impl Into<String>) -> Self {
        Self::ModeRejected {
            mode,
            message: message.into(),
        }
    }
}
