//! Transition history
//!
//! A bounded in-memory record of state changes, kept for operator
//! inspection. Not persisted; the history restarts empty with the
//! process.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::ServingState;
use super::target::TabletType;

/// One recorded state change.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionRecord {
    /// When the change took effect.
    pub timestamp: DateTime<Utc>,
    /// Tablet type after the change.
    pub tablet_type: TabletType,
    /// Public state name after the change.
    pub state_name: &'static str,
    /// Whether the tablet was in lameduck at the time.
    pub lameduck: bool,
}

impl TransitionRecord {
    /// Record the configuration a transition settled on.
    pub fn now(tablet_type: TabletType, state: ServingState, lameduck: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            tablet_type,
            state_name: state.name(),
            lameduck,
        }
    }
}

/// Bounded ring of transition records. Oldest entries fall off.
#[derive(Debug)]
pub struct TransitionHistory {
    records: Mutex<VecDeque<TransitionRecord>>,
    capacity: usize,
}

impl TransitionHistory {
    /// Create a history keeping at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a record, evicting the oldest when full.
    pub fn add(&self, record: TransitionRecord) {
        let mut records = self.records.lock().unwrap();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// All records, newest first.
    pub fn records(&self) -> Vec<TransitionRecord> {
        self.records.lock().unwrap().iter().rev().cloned().collect()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Check if no transition has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_are_newest_first() {
        let history = TransitionHistory::new(10);
        history.add(TransitionRecord::now(TabletType::Replica, ServingState::Serving, false));
        history.add(TransitionRecord::now(TabletType::Primary, ServingState::Serving, false));

        let records = history.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tablet_type, TabletType::Primary);
        assert_eq!(records[1].tablet_type, TabletType::Replica);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let history = TransitionHistory::new(2);
        history.add(TransitionRecord::now(TabletType::Replica, ServingState::NotServing, false));
        history.add(TransitionRecord::now(TabletType::Replica, ServingState::Serving, false));
        history.add(TransitionRecord::now(TabletType::Primary, ServingState::Serving, false));

        let records = history.records();
        assert_eq!(records.len(), 2);
        // The first record fell off; the remaining oldest is the replica serve.
        assert_eq!(records[1].tablet_type, TabletType::Replica);
        assert_eq!(records[1].state_name, "SERVING");
    }

    #[test]
    fn test_record_carries_public_state_name() {
        let record = TransitionRecord::now(TabletType::Rdonly, ServingState::NotConnected, true);
        assert_eq!(record.state_name, "NOT_SERVING");
        assert!(record.lameduck);
    }

    #[test]
    fn test_starts_empty() {
        let history = TransitionHistory::new(4);
        assert!(history.is_empty());
        assert_eq!(history.len(), 0);
    }
}
