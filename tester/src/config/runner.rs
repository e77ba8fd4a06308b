//! Runner Configuration
//!
//! Everything the driver needs to run each component's workload against a
//! test cluster.

use anyhow::{bail, Context, Result};
use cluster::ClusterConfig;
use shared::{validate_record_key, RunContext, ServiceDescriptor};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One component and test configuration, run against its own cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestTarget {
    pub component: String,
    pub test_config: String,
}

impl TestTarget {
    pub fn new<C: Into<String>, T: Into<String>>(component: C, test_config: T) -> Self {
        Self {
            component: component.into(),
            test_config: test_config.into(),
        }
    }

    /// Every component paired with every test configuration, components outermost
    pub fn matrix(components: &[String], test_configs: &[String]) -> Vec<Self> {
        components
            .iter()
            .flat_map(|component| test_configs.iter().map(move |config| Self::new(component, config)))
            .collect()
    }

    /// Directory name of this target's cluster inside the run's work directory
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.component, self.test_config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_record_key("component", &self.component)?;
        validate_record_key("test_config", &self.test_config)?;
        Ok(())
    }
}

impl fmt::Display for TestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.component, self.test_config)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Local directory or http(s) URL holding the distributions
    pub artifacts: String,
    pub version: String,
    pub architecture: String,
    pub build_id: String,
    /// Component/test-config pairs, run in order
    pub targets: Vec<TestTarget>,
    pub run_id: u64,
    pub test_type: String,
    /// Base directory of the result layout
    pub tests_dir: PathBuf,
    /// Parent of the cluster work directory; a temporary directory when unset
    pub work_dir: Option<PathBuf>,
    /// Keep a temporary work directory after the run
    pub keep: bool,
    pub security: bool,
    pub with_companion: bool,
    /// `key=value` settings appended to the primary's configuration
    pub settings: Vec<(String, String)>,
    /// Directories the workload writes its reports into
    pub result_dirs: Vec<PathBuf>,
    pub termination_timeout: Duration,
    /// Program and arguments of the workload
    pub workload: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            artifacts: String::new(),
            version: String::new(),
            architecture: "x64".to_string(),
            build_id: String::new(),
            targets: Vec::new(),
            run_id: 0,
            test_type: "integ-test".to_string(),
            tests_dir: PathBuf::from("test-results"),
            work_dir: None,
            keep: false,
            security: false,
            with_companion: false,
            settings: Vec::new(),
            result_dirs: Vec::new(),
            termination_timeout: Duration::from_secs(10),
            workload: Vec::new(),
        }
    }
}

impl RunnerConfig {
    /// Create a new builder
    pub fn builder() -> crate::config::builder::RunnerConfigBuilder {
        crate::config::builder::RunnerConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.artifacts.trim().is_empty() {
            bail!("an artifact source is required");
        }
        if self.workload.is_empty() {
            bail!("a workload command is required");
        }
        if self.targets.is_empty() {
            bail!("at least one component is required");
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            target.validate()?;
            if !seen.insert(target) {
                bail!("{target} is listed more than once");
            }
        }
        Ok(())
    }

    pub fn run_context(&self) -> RunContext {
        RunContext::new(self.run_id, self.test_type.clone(), self.tests_dir.clone())
    }

    pub fn primary_descriptor(&self) -> Result<ServiceDescriptor> {
        ServiceDescriptor::primary(&self.version, &self.architecture, &self.build_id)
            .context("invalid primary service descriptor")
    }

    pub fn companion_descriptor(&self) -> Result<ServiceDescriptor> {
        ServiceDescriptor::companion(&self.version, &self.architecture, &self.build_id)
            .context("invalid companion service descriptor")
    }

    /// Cluster settings for `target`, rooted at `work_dir`
    pub fn cluster_config(&self, target: &TestTarget, work_dir: &Path) -> ClusterConfig {
        let mut builder = ClusterConfig::builder()
            .work_dir(work_dir)
            .component(&target.component)
            .test_config(&target.test_config)
            .security(self.security)
            .termination_timeout(self.termination_timeout);

        for (key, value) in &self.settings {
            builder = builder.additional_setting(key.as_str(), parse_setting_value(value));
        }
        builder.build()
    }
}

/// YAML scalar when the value parses as one, plain string otherwise
pub fn parse_setting_value(raw: &str) -> serde_yaml::Value {
    match serde_yaml::from_str::<serde_yaml::Value>(raw) {
        Ok(value @ (serde_yaml::Value::Bool(_) | serde_yaml::Value::Number(_))) => value,
        _ => serde_yaml::Value::String(raw.to_string()),
    }
}

/// Split a `key=value` command-line setting
pub fn parse_setting(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("setting '{raw}' is not of the form key=value"))?;
    if key.trim().is_empty() {
        bail!("setting '{raw}' has an empty key");
    }
    Ok((key.trim().to_string(), value.to_string()))
}
