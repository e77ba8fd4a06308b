//! Integration test driver
//!
//! Runs each component's test workload against a freshly created test
//! cluster and records the outcomes.
//!
//! ```no_run
//! use tester::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = RunnerConfig::builder()
//!     .artifacts("/opt/artifacts")
//!     .distribution("1.1.0", "x64", "1234")
//!     .target("sql", "with_security")
//!     .target("sql", "without_security")
//!     .workload(vec!["./gradlew".into(), "integTest".into()])
//!     .build();
//!
//! let work = WorkDir::prepare(None, false)?;
//! let report = SuiteRun::new(config)?.execute(work.path()).await?;
//! work.close()?;
//! assert!(!report.failed());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod runtime;

// Main interfaces - re-exported at crate root for convenience
pub use config::{RunnerConfig, RunnerConfigBuilder, TestTarget};
pub use runtime::{ComponentRun, RunReport, SuiteReport, SuiteRun, WorkDir, WorkloadOutcome, WorkloadRunner};
