//! Result recorders
//!
//! Every recorder writes under `<base>/<run_id>/<test_type>/<component>/<test_config>/`.
//! The three roles are independent and differ only in what they populate:
//!
//! | role           | directory                    | stdout/stderr | log copies | summary |
//! |----------------|------------------------------|---------------|------------|---------|
//! | test results   | leaf                         | yes           | yes        | yes     |
//! | local cluster  | leaf/`local-cluster-logs`    | yes           | yes        | no      |
//! | remote cluster | leaf/`remote-cluster-logs`   | no            | no         | yes     |

use async_trait::async_trait;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use crate::error::{ClusterError, ClusterResult};
use crate::services::process_supervisor::{STDERR_FILE, STDOUT_FILE};
use crate::traits::{RecordOutcome, ResultRecorder};
use shared::{OutcomeSummary, RunContext, TestResultRecord};

pub const LOCAL_CLUSTER_LOGS_DIR: &str = "local-cluster-logs";
pub const REMOTE_CLUSTER_LOGS_DIR: &str = "remote-cluster-logs";

/// Path conventions and write primitives shared by the recorder roles
#[derive(Debug, Clone)]
struct RecordLayout {
    run: RunContext,
}

impl RecordLayout {
    fn new(run: RunContext) -> Self {
        Self { run }
    }

    /// Rejects keys that would leave the run's result tree
    fn leaf(&self, record: &TestResultRecord) -> ClusterResult<PathBuf> {
        Ok(self.run.result_dir(&record.component_name, &record.test_config)?)
    }

    fn summary_path(dir: &Path, record: &TestResultRecord) -> PathBuf {
        dir.join(format!("{}.yml", record.component_name))
    }

    fn summary(&self, record: &TestResultRecord) -> ClusterResult<String> {
        Ok(OutcomeSummary::new(&self.run, record).to_yaml()?)
    }

    async fn write_output(&self, dir: &Path, record: &TestResultRecord) -> ClusterResult<()> {
        for (file, content) in [(STDOUT_FILE, &record.stdout), (STDERR_FILE, &record.stderr)] {
            let path = dir.join(file);
            fs::write(&path, content).await?;
            tracing::info!("📝 Recorded {}", path.display());
        }
        Ok(())
    }

    /// Copy every mapped log directory; failures are returned, not raised
    async fn copy_logs(&self, dir: &Path, record: &TestResultRecord) -> Vec<ClusterError> {
        let mut failures = Vec::new();

        for (name, source) in &record.log_dirs {
            let log_copy_error = |reason: String| ClusterError::LogCopyError {
                name: name.clone(),
                source_dir: source.clone(),
                reason,
            };

            if !source.is_dir() {
                let error = log_copy_error("source directory does not exist".to_string());
                tracing::warn!("⚠️ {}", error);
                failures.push(error);
                continue;
            }

            let from = source.clone();
            let to = dir.join(name);
            let copied = tokio::task::spawn_blocking(move || copy_dir_recursive(&from, &to)).await;

            match copied {
                Ok(Ok(files)) => {
                    tracing::info!("📁 Copied {} file(s) from {} into {}", files, source.display(), dir.join(name).display());
                }
                Ok(Err(e)) => {
                    let error = log_copy_error(e.to_string());
                    tracing::warn!("⚠️ {}", error);
                    failures.push(error);
                }
                Err(e) => {
                    let error = log_copy_error(format!("copy task failed: {e}"));
                    tracing::warn!("⚠️ {}", error);
                    failures.push(error);
                }
            }
        }

        failures
    }
}

/// Recursive directory copy, returns the number of files copied
pub fn copy_dir_recursive(source: &Path, destination: &Path) -> io::Result<u64> {
    let mut copied = 0;
    std::fs::create_dir_all(destination)?;

    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(ErrorKind::Other, e))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Captured output and logs of a locally managed cluster
pub struct LocalClusterRecorder {
    layout: RecordLayout,
}

impl LocalClusterRecorder {
    pub fn new(run: RunContext) -> Self {
        Self {
            layout: RecordLayout::new(run),
        }
    }
}

#[async_trait]
impl ResultRecorder for LocalClusterRecorder {
    fn name(&self) -> &'static str {
        "local-cluster"
    }

    async fn record(&self, record: &TestResultRecord) -> ClusterResult<RecordOutcome> {
        let dir = self.layout.leaf(record)?.join(LOCAL_CLUSTER_LOGS_DIR);
        fs::create_dir_all(&dir).await?;

        self.layout.write_output(&dir, record).await?;
        let log_copy_failures = self.layout.copy_logs(&dir, record).await;

        Ok(RecordOutcome {
            location: dir,
            log_copy_failures,
        })
    }
}

/// Summary of a run against an externally managed cluster
pub struct RemoteClusterRecorder {
    layout: RecordLayout,
}

impl RemoteClusterRecorder {
    pub fn new(run: RunContext) -> Self {
        Self {
            layout: RecordLayout::new(run),
        }
    }
}

#[async_trait]
impl ResultRecorder for RemoteClusterRecorder {
    fn name(&self) -> &'static str {
        "remote-cluster"
    }

    async fn record(&self, record: &TestResultRecord) -> ClusterResult<RecordOutcome> {
        let dir = self.layout.leaf(record)?.join(REMOTE_CLUSTER_LOGS_DIR);
        fs::create_dir_all(&dir).await?;

        let path = RecordLayout::summary_path(&dir, record);
        fs::write(&path, self.layout.summary(record)?).await?;
        tracing::info!("📝 Recorded {}", path.display());

        Ok(RecordOutcome {
            location: dir,
            log_copy_failures: Vec::new(),
        })
    }
}

/// The workload's own outcome, at most once per run/component/config
pub struct TestResultsRecorder {
    layout: RecordLayout,
}

impl TestResultsRecorder {
    pub fn new(run: RunContext) -> Self {
        Self {
            layout: RecordLayout::new(run),
        }
    }
}

#[async_trait]
impl ResultRecorder for TestResultsRecorder {
    fn name(&self) -> &'static str {
        "test-results"
    }

    async fn record(&self, record: &TestResultRecord) -> ClusterResult<RecordOutcome> {
        let dir = self.layout.leaf(record)?;
        fs::create_dir_all(&dir).await?;

        // The summary file is the claim on this run/component/config key
        let path = RecordLayout::summary_path(&dir, record);
        let mut summary = match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ClusterError::DuplicateResult { path });
            }
            Err(e) => return Err(e.into()),
        };
        summary.write_all(self.layout.summary(record)?.as_bytes()).await?;
        summary.flush().await?;
        tracing::info!("📝 Recorded {}", path.display());

        self.layout.write_output(&dir, record).await?;
        let log_copy_failures = self.layout.copy_logs(&dir, record).await;

        Ok(RecordOutcome {
            location: dir,
            log_copy_failures,
        })
    }
}
