//! Tablet types and routing targets
//!
//! A target names the (keyspace, shard, tablet type) a client believes
//! it is talking to. Admission compares it against the tablet's own
//! identity; keyspace and shard are fixed at startup, only the tablet
//! type changes over the tablet's life.

use serde::Serialize;
use std::fmt;

/// Role of a tablet within its shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TabletType {
    /// Role not yet assigned.
    Unknown,
    /// Sole write authority for the shard.
    Primary,
    /// Replicates from the primary, serves reads, promotable.
    Replica,
    /// Serves batch/OLAP reads, never promoted.
    Rdonly,
    /// Provisioned but out of rotation.
    Spare,
    /// Taking a backup; not serving.
    Backup,
    /// Restoring from a backup; not serving, not connected.
    Restore,
    /// Administratively removed from rotation.
    Drained,
}

impl TabletType {
    /// Types that are eligible to serve client traffic.
    pub fn is_serving_type(&self) -> bool {
        matches!(self, Self::Primary | Self::Replica | Self::Rdonly)
    }

    /// Check if this is the primary role.
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Primary)
    }

    /// Uppercase name as used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Primary => "PRIMARY",
            Self::Replica => "REPLICA",
            Self::Rdonly => "RDONLY",
            Self::Spare => "SPARE",
            Self::Backup => "BACKUP",
            Self::Restore => "RESTORE",
            Self::Drained => "DRAINED",
        }
    }
}

impl Default for TabletType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for TabletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The (keyspace, shard, tablet type) triple requests are routed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Keyspace (logical database) name.
    pub keyspace: String,
    /// Shard name within the keyspace.
    pub shard: String,
    /// Role the tablet currently holds.
    pub tablet_type: TabletType,
}

impl Target {
    /// Create a target.
    pub fn new(keyspace: impl Into<String>, shard: impl Into<String>, tablet_type: TabletType) -> Self {
        Self {
            keyspace: keyspace.into(),
            shard: shard.into(),
            tablet_type,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.keyspace, self.shard, self.tablet_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serving_types() {
        assert!(TabletType::Primary.is_serving_type());
        assert!(TabletType::Replica.is_serving_type());
        assert!(TabletType::Rdonly.is_serving_type());

        assert!(!TabletType::Unknown.is_serving_type());
        assert!(!TabletType::Spare.is_serving_type());
        assert!(!TabletType::Backup.is_serving_type());
        assert!(!TabletType::Restore.is_serving_type());
        assert!(!TabletType::Drained.is_serving_type());
    }

    #[test]
    fn test_only_primary_is_primary() {
        assert!(TabletType::Primary.is_primary());
        assert!(!TabletType::Replica.is_primary());
        assert!(!TabletType::Rdonly.is_primary());
    }

    #[test]
    fn test_target_display() {
        let target = Target::new("commerce", "-80", TabletType::Replica);
        assert_eq!(target.to_string(), "commerce/-80 (REPLICA)");
    }
}
