//! Test cluster error types

use shared::SharedError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Artifact unavailable: {location}: {reason}")]
    ArtifactUnavailable { location: String, reason: String },

    #[error("Failed to unpack {archive}: {reason}")]
    UnpackError { archive: PathBuf, reason: String },

    #[error("Process already started, pid: {pid}")]
    AlreadyRunning { pid: u32 },

    #[error("Process has not started")]
    NotRunning,

    #[error("Failed to spawn {command} in {working_dir}: {reason}")]
    SpawnFailed {
        command: String,
        working_dir: PathBuf,
        reason: String,
    },

    #[error("Cluster is not available at {url} after {attempts} attempts")]
    ClusterNotAvailable { url: String, attempts: u32 },

    #[error("Process {pid} failed to terminate within {timeout:?} even after SIGKILL")]
    TerminationFailed {
        pid: u32,
        timeout: Duration,
        stdout: String,
        stderr: String,
    },

    #[error("Test result already recorded at {path}")]
    DuplicateResult { path: PathBuf },

    #[error("Failed to copy logs '{name}' from {source_dir}: {reason}")]
    LogCopyError {
        name: String,
        source_dir: PathBuf,
        reason: String,
    },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Cannot {operation} a cluster in state {state}")]
    InvalidState { operation: String, state: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl ClusterError {
    pub fn config<S: Into<String>>(field: S) -> Self {
        ClusterError::ConfigurationError { field: field.into() }
    }

    pub fn unavailable<S: Into<String>, R: std::fmt::Display>(location: S, reason: R) -> Self {
        ClusterError::ArtifactUnavailable {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unpack<P: Into<PathBuf>, R: std::fmt::Display>(archive: P, reason: R) -> Self {
        ClusterError::UnpackError {
            archive: archive.into(),
            reason: reason.to_string(),
        }
    }

    /// Errors that abort the cluster attempt during setup
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            ClusterError::ArtifactUnavailable { .. }
                | ClusterError::UnpackError { .. }
                | ClusterError::SpawnFailed { .. }
                | ClusterError::ClusterNotAvailable { .. }
        )
    }
}

pub type ClusterResult<T> = Result<T, ClusterError>;
