//! Integration Test Driver
//!
//! Runs the workload of every component/test-config target against a local
//! test cluster of its own:
//! - Fetches and starts the cluster (plus the UI companion when asked)
//! - Runs the workload with the cluster URLs and the target in its environment
//! - Records the outcome and tears the cluster down unconditionally
//!
//! Exits with status 1 when any target failed.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use shared::logging;
use tester::config::parse_setting;
use tester::{RunnerConfig, SuiteRun, TestTarget, WorkDir};

#[derive(Parser, Debug)]
#[command(name = "integ-test")]
#[command(about = "Run each component's integration tests against a local test cluster")]
struct Args {
    /// Artifact source: a local directory or an http(s) URL
    #[arg(long)]
    artifacts: String,

    /// Distribution version, e.g. 1.1.0
    #[arg(long)]
    version: String,

    /// Distribution architecture
    #[arg(long, default_value = "x64")]
    arch: String,

    /// Build identifier the artifacts are published under
    #[arg(long)]
    build_id: String,

    /// Component under test (repeatable)
    #[arg(long = "component", required = true)]
    components: Vec<String>,

    /// Test configuration name, run for every component (repeatable)
    #[arg(long = "test-config", default_value = "with_security")]
    test_configs: Vec<String>,

    /// Run identifier used in the result layout
    #[arg(long, default_value = "0")]
    run_id: u64,

    /// Test type used in the result layout
    #[arg(long, default_value = "integ-test")]
    test_type: String,

    /// Base directory for recorded results
    #[arg(long, default_value = "./test-results")]
    tests_dir: PathBuf,

    /// Parent of the cluster work directory (temporary when omitted)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Keep the temporary work directory after the run
    #[arg(long)]
    keep: bool,

    /// Run the cluster with the security plugin enabled
    #[arg(long)]
    security: bool,

    /// Also start the UI companion service
    #[arg(long)]
    with_companion: bool,

    /// Extra key=value setting for the primary's configuration (repeatable)
    #[arg(long = "setting", value_parser = parse_setting)]
    settings: Vec<(String, String)>,

    /// Directory the workload writes reports into (repeatable)
    #[arg(long = "result-dir")]
    result_dirs: Vec<PathBuf>,

    /// Seconds to wait at each termination step
    #[arg(long, default_value = "10")]
    termination_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Workload command, after `--`
    #[arg(last = true, required = true)]
    workload: Vec<String>,
}

impl Args {
    fn into_config(self) -> RunnerConfig {
        RunnerConfig::builder()
            .artifacts(self.artifacts)
            .distribution(self.version, self.arch, self.build_id)
            .targets(TestTarget::matrix(&self.components, &self.test_configs))
            .run_id(self.run_id)
            .test_type(self.test_type)
            .tests_dir(self.tests_dir)
            .work_dir(self.work_dir)
            .keep(self.keep)
            .security(self.security)
            .with_companion(self.with_companion)
            .settings(self.settings)
            .result_dirs(self.result_dirs)
            .termination_timeout(Duration::from_secs(self.termination_timeout_secs))
            .workload(self.workload)
            .build()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));

    let config = args.into_config();
    tracing::info!(
        "🧪 Integration tests for {} target(s), run {}",
        config.targets.len(),
        config.run_id
    );

    let suite = SuiteRun::new(config.clone())?;
    let work = WorkDir::prepare(config.work_dir.as_deref(), config.keep)?;
    let result = suite.execute(work.path()).await;
    if let Err(e) = work.close() {
        tracing::warn!("⚠️ {}", e);
    }

    let report = result?;
    report.log();
    if report.failed() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_args_map_to_runner_config() {
        let args = Args::try_parse_from([
            "integ-test",
            "--artifacts",
            "/opt/artifacts",
            "--version",
            "1.1.0",
            "--build-id",
            "1234",
            "--component",
            "sql",
            "--component",
            "k-NN",
            "--test-config",
            "security_disabled",
            "--run-id",
            "7",
            "--setting",
            "node.attr.zone=a",
            "--with-companion",
            "--",
            "./gradlew",
            "integTest",
        ])
        .unwrap();

        let config = args.into_config();

        assert_eq!(config.architecture, "x64");
        assert_eq!(config.run_id, 7);
        assert_eq!(
            config.targets,
            vec![
                TestTarget::new("sql", "security_disabled"),
                TestTarget::new("k-NN", "security_disabled"),
            ]
        );
        assert!(config.with_companion);
        assert!(!config.security);
        assert_eq!(config.settings, vec![("node.attr.zone".to_string(), "a".to_string())]);
        assert_eq!(config.workload, vec!["./gradlew".to_string(), "integTest".to_string()]);
        assert_eq!(config.tests_dir, PathBuf::from("./test-results"));
    }

    #[test]
    fn test_test_config_defaults_per_component() {
        let args = Args::try_parse_from([
            "integ-test",
            "--artifacts",
            "/opt/artifacts",
            "--version",
            "1.1.0",
            "--build-id",
            "1234",
            "--component",
            "sql",
            "--",
            "true",
        ])
        .unwrap();

        assert_eq!(args.into_config().targets, vec![TestTarget::new("sql", "with_security")]);
    }

    #[test]
    fn test_workload_is_required() {
        let result = Args::try_parse_from([
            "integ-test",
            "--artifacts",
            "/opt/artifacts",
            "--version",
            "1.1.0",
            "--build-id",
            "1234",
            "--component",
            "sql",
        ]);
        assert!(result.is_err());
    }
}
