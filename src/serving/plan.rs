//! Declarative transition plans
//!
//! Per SERVING_LIFECYCLE.md §4, every transition is an ordered action
//! sequence chosen by (role class, desired state). The sequences are
//! data, not control flow, so the dependency constraints they encode
//! are directly testable:
//!
//! - the schema engine opens before the query engine
//! - the transaction engine stops before query engine resources move
//! - the messager opens last on a primary and closes first everywhere
//! - write-side subsystems close and requests drain before anything
//!   else is touched when leaving a serving state

use super::state::ServingState;
use super::target::TabletType;

/// Subsystems addressed by generic open/close actions.
///
/// The transaction engine is absent: it has no open, and its close is
/// ordered differently, so it gets dedicated actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Schema engine
    Schema,
    /// Change-stream server
    VStreamer,
    /// Query engine
    Query,
    /// Transaction throttler
    Throttler,
    /// History writer (primary only)
    HistoryWriter,
    /// Schema tracker (primary only)
    Tracker,
    /// Message streamer (primary only)
    Messager,
    /// Health reporter (replica only)
    HealthReporter,
    /// Replication watcher (replica only)
    Watcher,
}

impl Component {
    /// Lowercase name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::VStreamer => "vstreamer",
            Self::Query => "query",
            Self::Throttler => "throttler",
            Self::HistoryWriter => "history_writer",
            Self::Tracker => "tracker",
            Self::Messager => "messager",
            Self::HealthReporter => "health_reporter",
            Self::Watcher => "watcher",
        }
    }
}

/// One step of a transition plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Open the component; aborts the plan if the open fails.
    Open(Component),
    /// Close the component; best-effort, never aborts.
    Close(Component),
    /// Close the transaction engine.
    CloseTxEngine,
    /// Latch the query engine into refusing new work.
    StopServing,
    /// Wait for in-flight requests, bounded by the shutdown grace.
    DrainRequests,
    /// Drop the schema engine's primary-only duties.
    MakeNonPrimary,
    /// Probe the backing store; aborts the plan if unreachable.
    CheckReachable,
    /// Put the transaction engine in read-write mode.
    AcceptReadWrite,
    /// Put the transaction engine in read-only mode.
    AcceptReadOnly,
}

/// Becoming primary and serving.
pub const SERVE_PRIMARY: &[Action] = &[
    Action::Close(Component::Watcher),
    Action::Close(Component::HealthReporter),
    Action::CheckReachable,
    Action::Open(Component::Schema),
    Action::Open(Component::VStreamer),
    Action::Open(Component::Query),
    Action::Open(Component::Throttler),
    Action::Open(Component::HistoryWriter),
    Action::Open(Component::Tracker),
    Action::AcceptReadWrite,
    Action::Open(Component::Messager),
];

/// Becoming replica/rdonly and serving.
pub const SERVE_NON_PRIMARY: &[Action] = &[
    Action::Close(Component::Messager),
    Action::Close(Component::Tracker),
    Action::Close(Component::HistoryWriter),
    Action::MakeNonPrimary,
    Action::CheckReachable,
    Action::Open(Component::Schema),
    Action::Open(Component::VStreamer),
    Action::Open(Component::Query),
    Action::Open(Component::Throttler),
    Action::AcceptReadOnly,
    Action::Open(Component::HealthReporter),
    Action::Open(Component::Watcher),
];

/// Primary going not-serving: shut the write side, drain, reopen for
/// maintenance.
pub const UNSERVE_PRIMARY: &[Action] = &[
    Action::Close(Component::Messager),
    Action::CloseTxEngine,
    Action::StopServing,
    Action::DrainRequests,
    Action::Close(Component::Watcher),
    Action::Close(Component::HealthReporter),
    Action::CheckReachable,
    Action::Open(Component::Schema),
    Action::Open(Component::VStreamer),
    Action::Open(Component::Query),
    Action::Open(Component::Throttler),
    Action::Open(Component::HistoryWriter),
    Action::Open(Component::Tracker),
];

/// Replica/rdonly going not-serving.
pub const UNSERVE_NON_PRIMARY: &[Action] = &[
    Action::Close(Component::Messager),
    Action::CloseTxEngine,
    Action::StopServing,
    Action::DrainRequests,
    Action::Close(Component::Tracker),
    Action::Close(Component::HistoryWriter),
    Action::MakeNonPrimary,
    Action::CheckReachable,
    Action::Open(Component::Schema),
    Action::Open(Component::VStreamer),
    Action::Open(Component::Query),
    Action::Open(Component::Throttler),
    Action::Open(Component::HealthReporter),
    Action::Open(Component::Watcher),
];

/// Full close to not-connected, reverse of open order.
pub const CLOSE_ALL: &[Action] = &[
    Action::Close(Component::Messager),
    Action::CloseTxEngine,
    Action::StopServing,
    Action::DrainRequests,
    Action::Close(Component::Throttler),
    Action::Close(Component::Query),
    Action::Close(Component::Watcher),
    Action::Close(Component::Tracker),
    Action::Close(Component::VStreamer),
    Action::Close(Component::HealthReporter),
    Action::Close(Component::HistoryWriter),
    Action::Close(Component::Schema),
];

/// Select the plan for a requested (tablet type, desired state).
pub fn transition_plan(tablet_type: TabletType, desired: ServingState) -> &'static [Action] {
    match desired {
        ServingState::NotConnected => CLOSE_ALL,
        ServingState::Serving => {
            if tablet_type.is_primary() {
                SERVE_PRIMARY
            } else {
                SERVE_NON_PRIMARY
            }
        }
        ServingState::NotServing => {
            if tablet_type.is_primary() {
                UNSERVE_PRIMARY
            } else {
                UNSERVE_NON_PRIMARY
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Action::*;
    use super::Component::*;

    /// Only open/close/accept steps bump the observable order counter;
    /// probes, latches, demotion, and draining do not.
    fn counted(plan: &[Action]) -> Vec<Action> {
        plan.iter()
            .copied()
            .filter(|a| {
                matches!(
                    a,
                    Open(_) | Close(_) | CloseTxEngine | AcceptReadWrite | AcceptReadOnly
                )
            })
            .collect()
    }

    #[test]
    fn test_serve_primary_order() {
        assert_eq!(
            counted(SERVE_PRIMARY),
            vec![
                Close(Watcher),
                Close(HealthReporter),
                Open(Schema),
                Open(VStreamer),
                Open(Query),
                Open(Throttler),
                Open(HistoryWriter),
                Open(Tracker),
                AcceptReadWrite,
                Open(Messager),
            ]
        );
    }

    #[test]
    fn test_serve_non_primary_order() {
        assert_eq!(
            counted(SERVE_NON_PRIMARY),
            vec![
                Close(Messager),
                Close(Tracker),
                Close(HistoryWriter),
                Open(Schema),
                Open(VStreamer),
                Open(Query),
                Open(Throttler),
                AcceptReadOnly,
                Open(HealthReporter),
                Open(Watcher),
            ]
        );
    }

    #[test]
    fn test_unserve_primary_order() {
        assert_eq!(
            counted(UNSERVE_PRIMARY),
            vec![
                Close(Messager),
                CloseTxEngine,
                Close(Watcher),
                Close(HealthReporter),
                Open(Schema),
                Open(VStreamer),
                Open(Query),
                Open(Throttler),
                Open(HistoryWriter),
                Open(Tracker),
            ]
        );
    }

    #[test]
    fn test_unserve_non_primary_order() {
        assert_eq!(
            counted(UNSERVE_NON_PRIMARY),
            vec![
                Close(Messager),
                CloseTxEngine,
                Close(Tracker),
                Close(HistoryWriter),
                Open(Schema),
                Open(VStreamer),
                Open(Query),
                Open(Throttler),
                Open(HealthReporter),
                Open(Watcher),
            ]
        );
    }

    #[test]
    fn test_close_all_is_reverse_open_order() {
        assert_eq!(
            counted(CLOSE_ALL),
            vec![
                Close(Messager),
                CloseTxEngine,
                Close(Throttler),
                Close(Query),
                Close(Watcher),
                Close(Tracker),
                Close(VStreamer),
                Close(HealthReporter),
                Close(HistoryWriter),
                Close(Schema),
            ]
        );
    }

    #[test]
    fn test_every_plan_touches_ten_subsystems() {
        for plan in [
            SERVE_PRIMARY,
            SERVE_NON_PRIMARY,
            UNSERVE_PRIMARY,
            UNSERVE_NON_PRIMARY,
            CLOSE_ALL,
        ] {
            assert_eq!(counted(plan).len(), 10);
        }
    }

    #[test]
    fn test_leaving_serving_drains_before_closing_read_side() {
        for plan in [UNSERVE_PRIMARY, UNSERVE_NON_PRIMARY, CLOSE_ALL] {
            let drain = plan.iter().position(|a| *a == DrainRequests).unwrap();
            let stop = plan.iter().position(|a| *a == StopServing).unwrap();
            let te = plan.iter().position(|a| *a == CloseTxEngine).unwrap();
            assert!(te < drain, "tx engine must close before draining");
            assert!(stop < drain, "query engine must stop before draining");
            // Nothing after the drain point may still be a write-side open.
            assert!(plan[..drain].contains(&Close(Messager)));
        }
    }

    #[test]
    fn test_plan_selection() {
        assert_eq!(
            transition_plan(TabletType::Primary, ServingState::Serving),
            SERVE_PRIMARY
        );
        assert_eq!(
            transition_plan(TabletType::Replica, ServingState::Serving),
            SERVE_NON_PRIMARY
        );
        assert_eq!(
            transition_plan(TabletType::Primary, ServingState::NotServing),
            UNSERVE_PRIMARY
        );
        assert_eq!(
            transition_plan(TabletType::Rdonly, ServingState::NotServing),
            UNSERVE_NON_PRIMARY
        );
        assert_eq!(
            transition_plan(TabletType::Rdonly, ServingState::NotConnected),
            CLOSE_ALL
        );
        assert_eq!(
            transition_plan(TabletType::Primary, ServingState::NotConnected),
            CLOSE_ALL
        );
    }

    #[test]
    fn test_schema_opens_before_query_engine() {
        for plan in [
            SERVE_PRIMARY,
            SERVE_NON_PRIMARY,
            UNSERVE_PRIMARY,
            UNSERVE_NON_PRIMARY,
        ] {
            let schema = plan.iter().position(|a| *a == Open(Schema)).unwrap();
            let query = plan.iter().position(|a| *a == Open(Query)).unwrap();
            assert!(schema < query);
        }
    }
}
