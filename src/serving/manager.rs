//! Serving State Manager
//!
//! Per SERVING_LIFECYCLE.md §3, the state manager owns the tablet's
//! lifecycle:
//! - transitions are mutually exclusive, serialized by a single-permit
//!   semaphore; concurrent callers queue and the last caller's
//!   configuration is the one that persists
//! - the scalar fields (state, want-state, target, also-allow,
//!   lameduck, retrying) live under one mutex that is held briefly and
//!   never across subsystem calls
//! - a failed transition is handed to a background retry loop; at most
//!   one retry loop exists at a time
//! - shutdown drains admitted requests, bounded by the shutdown grace
//!   period

use std::sync::{Arc, Mutex};
use std::thread;

use crate::observability::{Event, Logger, ServingMetrics};
use crate::subsystems::Subsystems;
use crate::sync::Semaphore;

use super::admission::RequestGate;
use super::config::ServingConfig;
use super::errors::{ServingError, ServingResult};
use super::history::{TransitionHistory, TransitionRecord};
use super::plan::{self, Action, Component};
use super::state::ServingState;
use super::target::{TabletType, Target};

/// Scalar state guarded by the manager's mutex.
#[derive(Debug)]
pub(super) struct SmState {
    /// Current lifecycle state.
    pub(super) state: ServingState,
    /// Last requested lifecycle state, recorded before transition work.
    pub(super) want_state: ServingState,
    /// Current identity; keyspace/shard never change.
    pub(super) target: Target,
    /// Last requested tablet type.
    pub(super) want_tablet_type: TabletType,
    /// Additional tablet types the admission gate accepts.
    pub(super) also_allow: Vec<TabletType>,
    /// Draining for shutdown; observers report not-serving.
    pub(super) lameduck: bool,
    /// A background retry loop is active.
    pub(super) retrying: bool,
}

/// Drives the tablet through its serving lifecycle.
///
/// Construct with [`StateManager::new`]; the manager is shared behind
/// an `Arc` because failed transitions and health rechecks spawn
/// background work that outlives the calling thread.
pub struct StateManager {
    pub(super) subsystems: Subsystems,
    pub(super) config: ServingConfig,
    pub(super) shared: Mutex<SmState>,
    /// Serializes transitions and the retry loop.
    pub(super) transitioning: Semaphore,
    /// Rate-limits backend health rechecks to one at a time.
    pub(super) check_permit: Semaphore,
    /// In-flight request counter with drain wait.
    pub(super) requests: RequestGate,
    pub(super) history: TransitionHistory,
    pub(super) metrics: ServingMetrics,
}

/// Restore tablets can only be not-connected, and roles that are not
/// eligible to serve can at most reach not-serving.
fn normalize_desired(tablet_type: TabletType, desired: ServingState) -> ServingState {
    if tablet_type == TabletType::Restore {
        ServingState::NotConnected
    } else if desired == ServingState::Serving && !tablet_type.is_serving_type() {
        ServingState::NotServing
    } else {
        desired
    }
}

impl StateManager {
    /// Create a state manager for the tablet identified by `target`.
    ///
    /// The tablet starts not-connected; the subsystem references are
    /// fixed for the manager's lifetime.
    pub fn new(target: Target, subsystems: Subsystems, config: ServingConfig) -> Arc<Self> {
        let history_capacity = config.history_capacity;
        Arc::new(Self {
            subsystems,
            shared: Mutex::new(SmState {
                state: ServingState::NotConnected,
                want_state: ServingState::NotConnected,
                want_tablet_type: target.tablet_type,
                target,
                also_allow: Vec::new(),
                lameduck: false,
                retrying: false,
            }),
            transitioning: Semaphore::new(1),
            check_permit: Semaphore::new(1),
            requests: RequestGate::new(),
            history: TransitionHistory::new(history_capacity),
            metrics: ServingMetrics::new(),
            config,
        })
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Move the tablet toward `(tablet_type, desired)`.
    ///
    /// Returns `Ok(false)` if the tablet was already configured as
    /// requested (the also-allow list is still re-recorded). Returns
    /// `Ok(true)` when a transition ran to completion. An `Err` means
    /// work toward the new configuration was performed but failed
    /// part-way; the background retry loop has taken over and the
    /// manager keeps retrying until it converges or is redirected by a
    /// later call.
    pub fn set_serving_type(
        self: &Arc<Self>,
        tablet_type: TabletType,
        desired: ServingState,
        also_allow: Vec<TabletType>,
    ) -> ServingResult<bool> {
        let desired = normalize_desired(tablet_type, desired);

        self.transitioning.acquire();
        let result = self.transition_locked(tablet_type, desired, also_allow);
        self.transitioning.release();
        result
    }

    fn transition_locked(
        self: &Arc<Self>,
        tablet_type: TabletType,
        desired: ServingState,
        also_allow: Vec<TabletType>,
    ) -> ServingResult<bool> {
        let change_needed = {
            let mut shared = self.shared.lock().unwrap();
            shared.want_state = desired;
            shared.want_tablet_type = tablet_type;
            shared.also_allow = also_allow;
            shared.target.tablet_type != tablet_type || shared.state != desired
        };
        if !change_needed {
            return Ok(false);
        }

        self.metrics.add_transition_started();
        let desired_str = format!("{:?}", desired);
        Logger::info(
            Event::TransitionStarted.as_str(),
            &[
                ("tablet_type", tablet_type.as_str()),
                ("desired_state", &desired_str),
            ],
        );

        match self.exec_transition(tablet_type, desired) {
            Ok(()) => {
                self.metrics.add_transition_completed();
                Logger::info(
                    Event::TransitionCompleted.as_str(),
                    &[
                        ("tablet_type", tablet_type.as_str()),
                        ("state", &desired_str),
                    ],
                );
                Ok(true)
            }
            Err(err) => {
                self.metrics.add_transition_failed();
                let detail = err.to_string();
                Logger::error(
                    Event::TransitionFailed.as_str(),
                    &[
                        ("tablet_type", tablet_type.as_str()),
                        ("desired_state", &desired_str),
                        ("error", &detail),
                    ],
                );
                self.retry_transition(&detail);
                Err(err)
            }
        }
    }

    fn exec_transition(&self, tablet_type: TabletType, desired: ServingState) -> ServingResult<()> {
        if desired == ServingState::NotConnected {
            self.close_all();
            return Ok(());
        }
        self.run_plan(plan::transition_plan(tablet_type, desired))?;
        self.set_state(tablet_type, desired);
        Ok(())
    }

    /// Close every subsystem and settle on not-connected. Close-side
    /// work is best-effort and cannot fail.
    fn close_all(&self) {
        // CLOSE_ALL contains no fallible actions.
        let _ = self.run_plan(plan::CLOSE_ALL);
        let want_tablet_type = self.shared.lock().unwrap().want_tablet_type;
        self.set_state(want_tablet_type, ServingState::NotConnected);
    }

    fn run_plan(&self, actions: &'static [Action]) -> ServingResult<()> {
        for action in actions {
            match *action {
                Action::Open(component) => self.open_component(component)?,
                Action::Close(component) => self.close_component(component),
                Action::CloseTxEngine => self.subsystems.tx.close(),
                Action::StopServing => self.subsystems.query.stop_serving(),
                Action::DrainRequests => self.drain_requests(),
                Action::MakeNonPrimary => self.subsystems.schema.make_non_primary(),
                Action::CheckReachable => self
                    .subsystems
                    .query
                    .is_mysql_reachable()
                    .map_err(|err| ServingError::transition(&err))?,
                Action::AcceptReadWrite => self
                    .subsystems
                    .tx
                    .accept_read_write()
                    .map_err(|err| ServingError::transition(&err))?,
                Action::AcceptReadOnly => self
                    .subsystems
                    .tx
                    .accept_read_only()
                    .map_err(|err| ServingError::transition(&err))?,
            }
        }
        Ok(())
    }

    fn open_component(&self, component: Component) -> ServingResult<()> {
        match component {
            Component::Schema => self
                .subsystems
                .schema
                .open()
                .map_err(|err| ServingError::transition(&err)),
            Component::Query => self
                .subsystems
                .query
                .open()
                .map_err(|err| ServingError::transition(&err)),
            Component::Throttler => self
                .subsystems
                .throttler
                .open()
                .map_err(|err| ServingError::transition(&err)),
            Component::VStreamer => {
                self.subsystems.vstreamer.open();
                Ok(())
            }
            Component::HistoryWriter => {
                self.subsystems.history_writer.open();
                Ok(())
            }
            Component::Tracker => {
                self.subsystems.tracker.open();
                Ok(())
            }
            Component::Messager => {
                self.subsystems.messager.open();
                Ok(())
            }
            Component::HealthReporter => {
                self.subsystems.health_reporter.open();
                Ok(())
            }
            Component::Watcher => {
                self.subsystems.watcher.open();
                Ok(())
            }
        }
    }

    fn close_component(&self, component: Component) {
        match component {
            Component::Schema => self.subsystems.schema.close(),
            Component::Query => self.subsystems.query.close(),
            Component::Throttler => self.subsystems.throttler.close(),
            Component::VStreamer => self.subsystems.vstreamer.close(),
            Component::HistoryWriter => self.subsystems.history_writer.close(),
            Component::Tracker => self.subsystems.tracker.close(),
            Component::Messager => self.subsystems.messager.close(),
            Component::HealthReporter => self.subsystems.health_reporter.close(),
            Component::Watcher => self.subsystems.watcher.close(),
        }
    }

    fn drain_requests(&self) {
        let active = self.requests.active();
        if active == 0 {
            return;
        }
        let active_str = active.to_string();
        Logger::info(Event::DrainStarted.as_str(), &[("in_flight", &active_str)]);

        let remaining = self.requests.wait_idle(self.config.shutdown_grace_period);
        if remaining > 0 {
            self.metrics.add_drain_timeout();
            let remaining_str = remaining.to_string();
            Logger::warn(Event::DrainTimedOut.as_str(), &[("in_flight", &remaining_str)]);
        }
    }

    /// Settle the new configuration. Entering Serving clears lameduck.
    fn set_state(&self, tablet_type: TabletType, state: ServingState) {
        let (lameduck, lameduck_cleared) = {
            let mut shared = self.shared.lock().unwrap();
            shared.target.tablet_type = tablet_type;
            shared.state = state;
            let cleared = state == ServingState::Serving && shared.lameduck;
            if cleared {
                shared.lameduck = false;
            }
            (shared.lameduck, cleared)
        };
        self.history.add(TransitionRecord::now(tablet_type, state, lameduck));
        if lameduck_cleared {
            Logger::info(Event::LameduckExited.as_str(), &[]);
        }
    }

    // =========================================================================
    // RETRY LOOP
    // =========================================================================

    /// Start the background retry loop toward the last requested
    /// configuration. A no-op while a retry loop is already active.
    pub fn retry_transition(self: &Arc<Self>, reason: &str) {
        {
            let mut shared = self.shared.lock().unwrap();
            if shared.retrying {
                return;
            }
            shared.retrying = true;
        }
        Logger::error(Event::RetryLoopStarted.as_str(), &[("reason", reason)]);

        let sm = Arc::clone(self);
        thread::spawn(move || loop {
            thread::sleep(sm.config.transition_retry_interval);

            // Re-read the wanted configuration each attempt: an
            // explicit call that arrived meanwhile redirects the loop.
            let (tablet_type, state, also_allow) = {
                let shared = sm.shared.lock().unwrap();
                (
                    shared.want_tablet_type,
                    shared.want_state,
                    shared.also_allow.clone(),
                )
            };
            sm.metrics.add_retry_attempt();
            if sm.set_serving_type(tablet_type, state, also_allow).is_ok() {
                sm.shared.lock().unwrap().retrying = false;
                Logger::info(
                    Event::RetryLoopEnded.as_str(),
                    &[("tablet_type", tablet_type.as_str())],
                );
                return;
            }
        });
    }

    // =========================================================================
    // BACKEND HEALTH
    // =========================================================================

    /// Recheck that the backing store answers. Throttled: a call while
    /// a recheck is outstanding is a no-op. A failed probe closes
    /// everything and hands recovery to the retry loop.
    pub fn check_mysql(self: &Arc<Self>) {
        if !self.check_permit.try_acquire() {
            return;
        }
        self.metrics.add_health_check();

        let sm = Arc::clone(self);
        thread::spawn(move || {
            sm.recheck_backend();
            sm.check_permit.release();
        });
    }

    fn recheck_backend(self: &Arc<Self>) {
        let err = match self.subsystems.query.is_mysql_reachable() {
            Ok(()) => return,
            Err(err) => err,
        };
        self.metrics.add_health_check_failure();
        let detail = err.to_string();
        Logger::error(Event::BackendUnreachable.as_str(), &[("error", &detail)]);

        // Serving stops entirely; the retry loop re-opens toward the
        // last wanted configuration once the backend answers again.
        // The retrying flag is raised before the transition permit is
        // released so observers never see a gap between the two.
        self.transitioning.acquire();
        self.close_all();
        self.retry_transition(&detail);
        self.transitioning.release();
    }

    // =========================================================================
    // OPERATIONAL SIGNALS
    // =========================================================================

    /// Shut the tablet down: transition to not-connected, draining
    /// in-flight requests along the way.
    pub fn stop_service(self: &Arc<Self>) {
        Logger::info(Event::ShutdownStarted.as_str(), &[]);
        let tablet_type = self.target().tablet_type;
        let _ = self.set_serving_type(tablet_type, ServingState::NotConnected, Vec::new());
        Logger::info(Event::ShutdownCompleted.as_str(), &[]);
    }

    /// Raise the lameduck flag: health observers report not-serving so
    /// load balancers steer traffic away. Does not transition. Cleared
    /// by the next successful transition into Serving.
    pub fn enter_lameduck(&self) {
        {
            let mut shared = self.shared.lock().unwrap();
            if shared.lameduck {
                return;
            }
            shared.lameduck = true;
        }
        self.metrics.add_lameduck_entry();
        Logger::info(Event::LameduckEntered.as_str(), &[]);
    }

    /// Clear the lameduck flag without a transition.
    pub fn exit_lameduck(&self) {
        {
            let mut shared = self.shared.lock().unwrap();
            if !shared.lameduck {
                return;
            }
            shared.lameduck = false;
        }
        Logger::info(Event::LameduckExited.as_str(), &[]);
    }

    // =========================================================================
    // OBSERVERS
    // =========================================================================

    /// Current lifecycle state.
    pub fn state(&self) -> ServingState {
        self.shared.lock().unwrap().state
    }

    /// Current identity, including the tablet type.
    pub fn target(&self) -> Target {
        self.shared.lock().unwrap().target.clone()
    }

    /// Public state name; lameduck forces the not-serving name.
    pub fn state_by_name(&self) -> &'static str {
        let shared = self.shared.lock().unwrap();
        if shared.lameduck {
            return "NOT_SERVING";
        }
        shared.state.name()
    }

    /// Check if the tablet accepts client requests right now.
    pub fn is_serving(&self) -> bool {
        let shared = self.shared.lock().unwrap();
        shared.state.is_serving() && !shared.lameduck
    }

    /// Check if a transition is executing right now.
    pub fn is_transitioning(&self) -> bool {
        if self.transitioning.try_acquire() {
            self.transitioning.release();
            return false;
        }
        true
    }

    /// Check if the background retry loop is active.
    pub fn is_retrying(&self) -> bool {
        self.shared.lock().unwrap().retrying
    }

    /// Recorded state changes, newest first.
    pub fn history(&self) -> Vec<TransitionRecord> {
        self.history.records()
    }

    /// Counter registry for this manager.
    pub fn metrics(&self) -> &ServingMetrics {
        &self.metrics
    }
}
