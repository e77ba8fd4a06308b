//! Test cluster lifecycle and result capture
//!
//! This library fetches a service distribution, starts it as a supervised
//! OS process, waits for it to answer its health endpoint, and on teardown
//! stops it (descendants first) and records its output, exit code and logs
//! into a per-run directory layout.

pub mod core;
pub mod error;
pub mod services;
pub mod test_cluster;
pub mod traits;

// Re-export commonly used types
pub use crate::core::{BodyCheck, ClusterConfig, ClusterConfigBuilder, ClusterState, ReadinessPolicy};
pub use error::{ClusterError, ClusterResult};
pub use services::{
    artifact_store_for, ArtifactFetcher, HttpArtifactStore, HttpReadinessProbe, LaunchCommand, LocalArtifactStore,
    LocalClusterRecorder, ManagedProcess, ProcessSupervisor, RemoteClusterRecorder, SystemProcessTree, Termination,
    TestResultsRecorder,
};
pub use test_cluster::{DestroyOutcome, TestCluster};
pub use traits::{ArtifactStore, ProcessTree, ReadinessProbe, RecordOutcome, ResultRecorder};
