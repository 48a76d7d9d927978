//! Subsystem capability contracts
//!
//! The state manager coordinates nine subsystems but depends only on
//! their lifecycle capabilities, never on concrete implementations.
//! Subsystems are heterogeneous, so the contracts are split into narrow
//! capability traits instead of one wide interface:
//!
//! - `Lifecycle`: infallible open/close (vstreamer, history writer,
//!   schema tracker, messager, health reporter, replication watcher)
//! - `SchemaEngine`: fallible open, plus demotion to non-primary
//! - `QueryEngine`: fallible open, backend reachability probe, and a
//!   stop-serving latch
//! - `TxEngine`: no open; role-specific accept methods
//! - `TxThrottler`: fallible open
//!
//! All implementations must be individually thread-safe for the calls
//! the state manager makes; the manager never holds its own mutex
//! across them.

use std::sync::Arc;

mod errors;

pub use errors::{SubsystemError, SubsystemResult};

/// Basic open/close lifecycle for subsystems whose open cannot fail.
///
/// `close` must be idempotent and must tolerate being called while
/// requests are still executing: shutdown proceeds after the drain
/// grace period even if the in-flight counter never reached zero.
pub trait Lifecycle: Send + Sync {
    /// Bring the subsystem up.
    fn open(&self);

    /// Tear the subsystem down. Best-effort, idempotent.
    fn close(&self);
}

/// Schema engine: loads and serves table schemas.
///
/// Must be open before the query engine opens.
pub trait SchemaEngine: Send + Sync {
    /// Load schemas and start change tracking.
    fn open(&self) -> SubsystemResult;

    /// Drop primary-only duties (DDL application) without closing.
    fn make_non_primary(&self);

    /// Release schema resources. Best-effort, idempotent.
    fn close(&self);
}

/// Query engine: executes reads against the backing store.
pub trait QueryEngine: Send + Sync {
    /// Open connection pools and plan caches.
    fn open(&self) -> SubsystemResult;

    /// Probe whether the backing MySQL instance answers.
    fn is_mysql_reachable(&self) -> SubsystemResult;

    /// Latch the engine into refusing new work. Existing work drains
    /// separately through the request gate.
    fn stop_serving(&self);

    /// Release pools and caches. Best-effort, idempotent.
    fn close(&self);
}

/// Transaction engine: has no open; it enters a role-specific mode.
pub trait TxEngine: Send + Sync {
    /// Accept read-write transactions (primary only).
    fn accept_read_write(&self) -> SubsystemResult;

    /// Accept read-only transactions (replica / rdonly).
    fn accept_read_only(&self) -> SubsystemResult;

    /// Roll back prepared state and stop accepting. Best-effort.
    fn close(&self);
}

/// Transaction throttler: paces writes based on replication lag.
pub trait TxThrottler: Send + Sync {
    /// Start the throttler's lag monitoring.
    fn open(&self) -> SubsystemResult;

    /// Stop monitoring. Best-effort, idempotent.
    fn close(&self);
}

/// The fixed set of subsystem references the state manager coordinates.
///
/// Each reference is set once at construction and never re-parented.
#[derive(Clone)]
pub struct Subsystems {
    /// Schema engine (role-dependent behavior via `make_non_primary`)
    pub schema: Arc<dyn SchemaEngine>,
    /// Change-stream server
    pub vstreamer: Arc<dyn Lifecycle>,
    /// Query engine
    pub query: Arc<dyn QueryEngine>,
    /// Transaction throttler
    pub throttler: Arc<dyn TxThrottler>,
    /// History writer (primary only)
    pub history_writer: Arc<dyn Lifecycle>,
    /// Schema tracker (primary only)
    pub tracker: Arc<dyn Lifecycle>,
    /// Transaction engine
    pub tx: Arc<dyn TxEngine>,
    /// Message streamer (primary only)
    pub messager: Arc<dyn Lifecycle>,
    /// Health reporter (replica only)
    pub health_reporter: Arc<dyn Lifecycle>,
    /// Replication watcher (replica only)
    pub watcher: Arc<dyn Lifecycle>,
}
