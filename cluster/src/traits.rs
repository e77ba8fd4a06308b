//! Collaborator seams of the cluster lifecycle engine
//!
//! Each trait carries a mockall annotation so the state machine and the
//! supervisor can be exercised without a real artifact store, HTTP target
//! or process table.

use crate::core::ReadinessPolicy;
use crate::error::{ClusterError, ClusterResult};
use shared::TestResultRecord;
use std::path::PathBuf;

/// What a recorder wrote for one [`TestResultRecord`]
#[derive(Debug, Default)]
pub struct RecordOutcome {
    /// Directory the record was written into
    pub location: PathBuf,
    /// Log directories that could not be copied; the rest of the record was still written
    pub log_copy_failures: Vec<ClusterError>,
}

impl RecordOutcome {
    pub fn is_complete(&self) -> bool {
        self.log_copy_failures.is_empty()
    }
}

/// Retrieves a named blob given a location descriptor
#[mockall::automock]
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Fails with `ArtifactUnavailable` when the object does not exist or the transfer errors
    async fn fetch(&self, location: &str) -> ClusterResult<Vec<u8>>;
}

/// Process table access used for escalating termination
#[mockall::automock]
pub trait ProcessTree: Send + Sync {
    /// All descendants of `pid`, recursively, excluding `pid` itself
    fn descendants(&self, pid: u32) -> Vec<u32>;

    /// Graceful termination signal (SIGTERM)
    fn terminate(&self, pid: u32) -> ClusterResult<()>;

    /// Hard kill signal (SIGKILL)
    fn kill(&self, pid: u32) -> ClusterResult<()>;
}

/// Polls a service endpoint until it satisfies a readiness policy
#[mockall::automock]
#[async_trait::async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Returns the attempt number that succeeded
    async fn wait_until_ready(&self, url: &str, policy: &ReadinessPolicy) -> ClusterResult<u32>;
}

/// Writes a result record into a run's on-disk layout
#[mockall::automock]
#[async_trait::async_trait]
pub trait ResultRecorder: Send + Sync {
    /// Short role name used in logs
    fn name(&self) -> &'static str;

    async fn record(&self, record: &TestResultRecord) -> ClusterResult<RecordOutcome>;
}
