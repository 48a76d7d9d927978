//! Observability for the serving lifecycle
//!
//! Structured JSON logging, typed events, and counter metrics. All
//! synchronous and allocation-light; the state manager calls into this
//! module outside its own mutex.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::ServingMetrics;
