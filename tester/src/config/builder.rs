//! Runner Configuration Builder
//!
//! Provides a fluent builder for constructing runner configurations

use super::{RunnerConfig, TestTarget};
use std::path::PathBuf;
use std::time::Duration;

pub struct RunnerConfigBuilder {
    config: RunnerConfig,
}

impl RunnerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RunnerConfig::default(),
        }
    }

    /// Set the artifact source (directory or http(s) URL)
    pub fn artifacts<S: Into<String>>(mut self, source: S) -> Self {
        self.config.artifacts = source.into();
        self
    }

    /// Set the distribution version, architecture and build id
    pub fn distribution<V: Into<String>, A: Into<String>, B: Into<String>>(
        mut self,
        version: V,
        architecture: A,
        build_id: B,
    ) -> Self {
        self.config.version = version.into();
        self.config.architecture = architecture.into();
        self.config.build_id = build_id.into();
        self
    }

    /// Add a component under test with one test configuration name
    pub fn target<C: Into<String>, T: Into<String>>(mut self, component: C, test_config: T) -> Self {
        self.config.targets.push(TestTarget::new(component, test_config));
        self
    }

    pub fn targets(mut self, targets: Vec<TestTarget>) -> Self {
        self.config.targets = targets;
        self
    }

    pub fn run_id(mut self, run_id: u64) -> Self {
        self.config.run_id = run_id;
        self
    }

    pub fn test_type<S: Into<String>>(mut self, test_type: S) -> Self {
        self.config.test_type = test_type.into();
        self
    }

    pub fn tests_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.tests_dir = dir.into();
        self
    }

    pub fn work_dir<P: Into<PathBuf>>(mut self, dir: Option<P>) -> Self {
        self.config.work_dir = dir.map(Into::into);
        self
    }

    pub fn keep(mut self, keep: bool) -> Self {
        self.config.keep = keep;
        self
    }

    pub fn security(mut self, enabled: bool) -> Self {
        self.config.security = enabled;
        self
    }

    pub fn with_companion(mut self, enabled: bool) -> Self {
        self.config.with_companion = enabled;
        self
    }

    pub fn settings(mut self, settings: Vec<(String, String)>) -> Self {
        self.config.settings = settings;
        self
    }

    pub fn result_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.config.result_dirs = dirs;
        self
    }

    pub fn termination_timeout(mut self, timeout: Duration) -> Self {
        self.config.termination_timeout = timeout;
        self
    }

    /// Set the workload program and its arguments
    pub fn workload(mut self, command: Vec<String>) -> Self {
        self.config.workload = command;
        self
    }

    /// Build the configuration
    pub fn build(self) -> RunnerConfig {
        self.config
    }
}

impl Default for RunnerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
