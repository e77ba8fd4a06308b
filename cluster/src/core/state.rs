//! Aggregate lifecycle state of a test cluster

use std::fmt;

/// Lifecycle state of a [`crate::TestCluster`]
///
/// `Fetching` and `Starting` are re-entered once per managed service, so a
/// cluster with a companion passes through them twice before `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterState {
    Unprovisioned,
    Fetching,
    Starting,
    Ready,
    Destroying,
    Destroyed,
    Failed,
}

impl ClusterState {
    /// Only a fresh cluster may be created
    pub fn can_create(&self) -> bool {
        matches!(self, ClusterState::Unprovisioned)
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClusterState::Unprovisioned => "Unprovisioned",
            ClusterState::Fetching => "Fetching",
            ClusterState::Starting => "Starting",
            ClusterState::Ready => "Ready",
            ClusterState::Destroying => "Destroying",
            ClusterState::Destroyed => "Destroyed",
            ClusterState::Failed => "Failed",
        };
        write!(f, "{name}")
    }
}
