//! Workload Execution
//!
//! Runs the test workload to completion against a ready cluster and
//! captures its output.

use anyhow::{Context, Result};
use shared::UNKNOWN_EXIT_CODE;
use std::process::Stdio;
use tokio::process::Command;

/// Exit code and captured output of one workload run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl WorkloadOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

pub struct WorkloadRunner {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl WorkloadRunner {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command.split_first().context("workload command is empty")?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            env: Vec::new(),
        })
    }

    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Run to completion; only a failure to launch is an error
    pub async fn run(&self) -> Result<WorkloadOutcome> {
        tracing::info!("🧪 Running workload: {} {}", self.program, self.args.join(" "));

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null());

        let output = cmd
            .output()
            .await
            .with_context(|| format!("failed to launch workload {}", self.program))?;

        let outcome = WorkloadOutcome {
            exit_code: output.status.code().unwrap_or(UNKNOWN_EXIT_CODE),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if outcome.succeeded() {
            tracing::info!("✅ Workload finished with exit code 0");
        } else {
            tracing::warn!("⚠️ Workload finished with exit code {}", outcome.exit_code);
        }
        Ok(outcome)
    }
}
