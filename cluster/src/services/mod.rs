//! Service implementations
//!
//! Real implementations of the collaborator traits plus the process
//! supervisor. These handle the actual I/O: files, archives, HTTP and
//! OS processes.

pub mod artifact_fetcher;
pub mod artifact_store;
pub mod process_supervisor;
pub mod process_tree;
pub mod readiness_probe;
pub mod recorder;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use artifact_fetcher::ArtifactFetcher;
pub use artifact_store::{artifact_store_for, HttpArtifactStore, LocalArtifactStore};
pub use process_supervisor::{LaunchCommand, ManagedProcess, ProcessSupervisor, Termination};
pub use process_tree::SystemProcessTree;
pub use readiness_probe::HttpReadinessProbe;
pub use recorder::{
    LocalClusterRecorder, RemoteClusterRecorder, TestResultsRecorder, LOCAL_CLUSTER_LOGS_DIR,
    REMOTE_CLUSTER_LOGS_DIR,
};
