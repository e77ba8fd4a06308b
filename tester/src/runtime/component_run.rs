//! Component Run
//!
//! One pass of the driver loop: create the cluster, run the workload,
//! record its outcome, then destroy the cluster whatever happened before.

use anyhow::Result;
use cluster::{
    artifact_store_for, DestroyOutcome, LocalClusterRecorder, RecordOutcome, ResultRecorder, TestCluster,
    TestResultsRecorder,
};
use shared::{logging, RunContext, TestResultRecord};
use std::path::Path;
use std::sync::Arc;

use super::workload::{WorkloadOutcome, WorkloadRunner};
use crate::config::{RunnerConfig, TestTarget};

pub const CLUSTER_URL_ENV: &str = "CLUSTER_URL";
pub const COMPANION_URL_ENV: &str = "COMPANION_URL";
pub const COMPONENT_ENV: &str = "TEST_COMPONENT";
pub const TEST_CONFIG_ENV: &str = "TEST_CONFIG";

/// What happened during one component run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub component: String,
    pub test_config: String,
    /// Absent when the workload never ran
    pub workload_exit_code: Option<i32>,
    /// Lifecycle operations that failed, in order
    pub failures: Vec<String>,
}

impl RunReport {
    pub fn new(target: &TestTarget) -> Self {
        Self {
            component: target.component.clone(),
            test_config: target.test_config.clone(),
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failures.is_empty() && self.workload_exit_code == Some(0)
    }
}

pub struct ComponentRun<'a> {
    config: &'a RunnerConfig,
    target: &'a TestTarget,
}

impl<'a> ComponentRun<'a> {
    pub fn new(config: &'a RunnerConfig, target: &'a TestTarget) -> Result<Self> {
        target.validate()?;
        Ok(Self { config, target })
    }

    pub async fn execute(&self, work_dir: &Path) -> Result<RunReport> {
        let run = self.config.run_context();
        let store = artifact_store_for(&self.config.artifacts)?;
        let recorder = Arc::new(LocalClusterRecorder::new(run.clone()));

        let mut cluster = TestCluster::new(
            self.config.cluster_config(self.target, work_dir),
            self.config.primary_descriptor()?,
            store,
            recorder,
        )?;
        if self.config.with_companion {
            cluster = cluster.with_companion(self.config.companion_descriptor()?)?;
        }

        let component = &self.target.component;
        let mut report = RunReport::new(self.target);

        match cluster.create().await {
            Ok(()) => match self.run_workload(&cluster).await {
                Ok(outcome) => {
                    report.workload_exit_code = Some(outcome.exit_code);
                    if let Err(e) = self.record_workload(&run, &outcome).await {
                        logging::log_error(component, "Recording test results", &e);
                        report.failures.push(format!("record: {e}"));
                    }
                }
                Err(e) => {
                    logging::log_error(component, "Workload", &e);
                    report.failures.push(format!("workload: {e}"));
                }
            },
            Err(e) => {
                // Setup failures mean the cluster never came up, anything else is a lifecycle fault
                let stage = if e.is_setup_failure() { "setup" } else { "create" };
                report.failures.push(format!("{stage}: {e}"));
            }
        }

        match cluster.destroy().await {
            Ok(DestroyOutcome::Recorded(outcome)) => log_record(&outcome),
            Ok(outcome) => {
                tracing::info!("Teardown finished: {:?}", outcome);
            }
            Err(e) => {
                logging::log_error(component, "Destroying test cluster", &e);
                report.failures.push(format!("destroy: {e}"));
            }
        }

        Ok(report)
    }

    async fn run_workload(&self, cluster: &TestCluster) -> Result<WorkloadOutcome> {
        let mut runner = WorkloadRunner::new(&self.config.workload)?
            .env(CLUSTER_URL_ENV, cluster.url(""))
            .env(COMPONENT_ENV, self.target.component.as_str())
            .env(TEST_CONFIG_ENV, self.target.test_config.as_str());
        if let Some(url) = cluster.companion_url("") {
            runner = runner.env(COMPANION_URL_ENV, url);
        }
        runner.run().await
    }

    /// Hand the workload's outcome to the test-results recorder
    pub async fn record_workload(&self, run: &RunContext, outcome: &WorkloadOutcome) -> Result<RecordOutcome> {
        let mut record = TestResultRecord::new(
            self.target.component.clone(),
            self.target.test_config.clone(),
            outcome.exit_code,
        )
        .with_output(outcome.stdout.clone(), outcome.stderr.clone());

        for dir in &self.config.result_dirs {
            let name = dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "results".to_string());
            record = record.with_log_dir(name, dir);
        }

        let recorded = TestResultsRecorder::new(run.clone()).record(&record).await?;
        log_record(&recorded);
        Ok(recorded)
    }
}

fn log_record(outcome: &RecordOutcome) {
    tracing::info!("📝 Results recorded in {}", outcome.location.display());
    for failure in &outcome.log_copy_failures {
        tracing::warn!("⚠️ {}", failure);
    }
}
