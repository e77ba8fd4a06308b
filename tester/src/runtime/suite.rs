//! Suite Run
//!
//! Runs every configured target in turn, each against a cluster of its own
//! in a separate subdirectory of the work directory, and collects the reports.
//! A failing target never stops the ones after it.

use anyhow::{Context, Result};
use shared::logging;
use std::path::Path;

use super::component_run::{ComponentRun, RunReport};
use crate::config::{RunnerConfig, TestTarget};

/// Reports of every target in the order they ran
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub reports: Vec<RunReport>,
}

impl SuiteReport {
    pub fn failed(&self) -> bool {
        self.reports.iter().any(|report| !report.succeeded())
    }

    pub fn failures(&self) -> impl Iterator<Item = &RunReport> {
        self.reports.iter().filter(|report| !report.succeeded())
    }

    pub fn log(&self) {
        for report in &self.reports {
            if report.succeeded() {
                tracing::info!("✅ {} ({}) passed", report.component, report.test_config);
                continue;
            }
            for failure in &report.failures {
                tracing::error!("❌ {} ({}): {}", report.component, report.test_config, failure);
            }
            tracing::error!(
                "❌ {} ({}) failed, workload exit code: {:?}",
                report.component,
                report.test_config,
                report.workload_exit_code
            );
        }

        let failed = self.failures().count();
        tracing::info!("📊 {} target(s) run, {} failed", self.reports.len(), failed);
    }
}

pub struct SuiteRun {
    config: RunnerConfig,
}

impl SuiteRun {
    pub fn new(config: RunnerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub async fn execute(&self, work_dir: &Path) -> Result<SuiteReport> {
        let mut suite = SuiteReport::default();

        for target in &self.config.targets {
            tracing::info!("🧪 Running {}", target);
            let report = match self.run_target(target, work_dir).await {
                Ok(report) => report,
                Err(e) => {
                    logging::log_error(&target.component, "Running target", &e);
                    let mut report = RunReport::new(target);
                    report.failures.push(format!("run: {e:#}"));
                    report
                }
            };
            suite.reports.push(report);
        }

        Ok(suite)
    }

    async fn run_target(&self, target: &TestTarget, work_dir: &Path) -> Result<RunReport> {
        let target_dir = work_dir.join(target.dir_name());
        tokio::fs::create_dir_all(&target_dir)
            .await
            .with_context(|| format!("failed to create {}", target_dir.display()))?;

        ComponentRun::new(&self.config, target)?.execute(&target_dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(artifacts: &str, tests_dir: &Path) -> RunnerConfig {
        RunnerConfig::builder()
            .artifacts(artifacts)
            .distribution("1.1.0", "x64", "1234")
            .target("sql", "with_security")
            .target("k-NN", "with_security")
            .run_id(3)
            .tests_dir(tests_dir)
            .workload(vec!["true".to_string()])
            .build()
    }

    #[tokio::test]
    async fn test_every_target_runs_and_reports_in_order() {
        let artifacts = TempDir::new().unwrap();
        let results = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();

        let suite = SuiteRun::new(config(&artifacts.path().to_string_lossy(), results.path())).unwrap();
        let report = suite.execute(work.path()).await.unwrap();

        // No distributions were published, so each target fails on its own
        assert_eq!(report.reports.len(), 2);
        assert_eq!(report.reports[0].component, "sql");
        assert_eq!(report.reports[1].component, "k-NN");
        assert!(report.failed());
        assert_eq!(report.failures().count(), 2);
        assert!(work.path().join("sql-with_security").is_dir());
        assert!(work.path().join("k-NN-with_security").is_dir());
    }

    #[tokio::test]
    async fn test_unusable_artifact_source_is_reported_per_target() {
        let results = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();

        let suite = SuiteRun::new(config("http://", results.path())).unwrap();
        let report = suite.execute(work.path()).await.unwrap();

        assert_eq!(report.reports.len(), 2);
        for run in &report.reports {
            assert_eq!(run.workload_exit_code, None);
            assert!(run.failures[0].starts_with("run:"), "{:?}", run.failures);
        }
    }

    #[test]
    fn test_suite_fails_when_any_target_fails() {
        let passed = RunReport {
            component: "sql".to_string(),
            test_config: "a".to_string(),
            workload_exit_code: Some(0),
            failures: Vec::new(),
        };
        let mut suite = SuiteReport {
            reports: vec![passed.clone()],
        };
        assert!(!suite.failed());

        suite.reports.push(RunReport {
            workload_exit_code: Some(1),
            ..passed
        });
        assert!(suite.failed());
        assert_eq!(suite.failures().count(), 1);
    }

    #[test]
    fn test_empty_target_list_is_rejected() {
        let results = TempDir::new().unwrap();
        let mut config = config("/opt/artifacts", results.path());
        config.targets.clear();
        assert!(SuiteRun::new(config).is_err());
    }
}
