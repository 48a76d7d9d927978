//! Request admission
//!
//! Per ADMISSION.md, every client request passes the admission gate
//! before any handler runs:
//! - server-internal (local) requests are admitted unconditionally
//! - the tablet must be serving, or draining with `allow_on_shutdown`
//! - the request's target must name this tablet's keyspace, shard, and
//!   tablet type (or a type on the also-allow list)
//!
//! Admission observes one consistent snapshot of the serving state. It
//! does not order against concurrent transitions: a subsystem may stop
//! right after a request is admitted, and must fail that request
//! itself.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::observability::{Event, Logger};

use super::context::RequestContext;
use super::errors::{ServingError, ServingResult};
use super::manager::StateManager;
use super::state::ServingState;
use super::target::Target;

/// In-flight request counter with a drain wait.
///
/// Incremented on admission, decremented on completion. Shutdown waits
/// on it; the wait is bounded by the shutdown grace period.
#[derive(Debug, Default)]
pub(super) struct RequestGate {
    active: Mutex<u64>,
    became_idle: Condvar,
}

impl RequestGate {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Count one admitted request.
    pub(super) fn start(&self) {
        *self.active.lock().unwrap() += 1;
    }

    /// Count one finished request and wake the drain waiter at zero.
    pub(super) fn end(&self) {
        let mut active = self.active.lock().unwrap();
        debug_assert!(*active > 0, "end_request without a matching start_request");
        *active = active.saturating_sub(1);
        if *active == 0 {
            self.became_idle.notify_all();
        }
    }

    /// Number of requests currently in flight.
    pub(super) fn active(&self) -> u64 {
        *self.active.lock().unwrap()
    }

    /// Wait until no requests are in flight, or `grace` elapses.
    /// Zero grace waits without bound. Returns the in-flight count at
    /// the time the wait ended (0 means fully drained).
    pub(super) fn wait_idle(&self, grace: Duration) -> u64 {
        let guard = self.active.lock().unwrap();
        if grace.is_zero() {
            *self
                .became_idle
                .wait_while(guard, |active| *active > 0)
                .unwrap()
        } else {
            let (guard, _timeout) = self
                .became_idle
                .wait_timeout_while(guard, grace, |active| *active > 0)
                .unwrap();
            *guard
        }
    }
}

impl StateManager {
    /// Admit a request and count it in flight.
    ///
    /// Every successful `start_request` must be paired with exactly one
    /// `end_request`, including local requests.
    pub fn start_request(
        &self,
        ctx: &RequestContext,
        target: Option<&Target>,
        allow_on_shutdown: bool,
    ) -> ServingResult<()> {
        if let Err(err) = self.check_admission(ctx, target, allow_on_shutdown) {
            self.metrics.add_request_rejected();
            let request_id = ctx.request_id.to_string();
            let elapsed_ms = ctx.elapsed_ms().to_string();
            let detail = err.to_string();
            Logger::trace(
                Event::RequestRejected.as_str(),
                &[
                    ("elapsed_ms", &elapsed_ms),
                    ("error", &detail),
                    ("request_id", &request_id),
                ],
            );
            return Err(err);
        }
        self.requests.start();
        self.metrics.add_request_admitted();
        Ok(())
    }

    /// Mark an admitted request as finished.
    pub fn end_request(&self) {
        self.requests.end();
    }

    /// Run the admission predicate without counting the request.
    pub fn verify_target(&self, ctx: &RequestContext, target: Option<&Target>) -> ServingResult<()> {
        self.check_admission(ctx, target, false)
    }

    fn check_admission(
        &self,
        ctx: &RequestContext,
        target: Option<&Target>,
        allow_on_shutdown: bool,
    ) -> ServingResult<()> {
        if ctx.is_local() {
            return Ok(());
        }

        let shared = self.shared.lock().unwrap();

        if shared.state != ServingState::Serving || shared.want_state != ServingState::Serving {
            // Still admit long-running work while draining (state is
            // Serving on the way down), never during cold start.
            if !(allow_on_shutdown && shared.state == ServingState::Serving) {
                return Err(ServingError::not_serving(shared.state.name()));
            }
        }

        let Some(target) = target else {
            return Err(ServingError::no_target());
        };

        if target.keyspace != shared.target.keyspace {
            return Err(ServingError::invalid_keyspace(
                &target.keyspace,
                &shared.target.keyspace,
            ));
        }
        if target.shard != shared.target.shard {
            return Err(ServingError::invalid_shard(&target.shard, &shared.target.shard));
        }
        if target.tablet_type != shared.target.tablet_type
            && !shared.also_allow.contains(&target.tablet_type)
        {
            let also_allow = shared
                .also_allow
                .iter()
                .map(|tablet_type| tablet_type.as_str())
                .collect::<Vec<_>>()
                .join(",");
            return Err(ServingError::invalid_tablet_type(
                target.tablet_type.as_str(),
                shared.target.tablet_type.as_str(),
                &format!("[{}]", also_allow),
            ));
        }

        Ok(())
    }
}
