//! Test cluster configuration
//!
//! Provides a fluent builder for the settings a [`crate::TestCluster`] needs.

use crate::error::{ClusterError, ClusterResult};
use serde_yaml::{Mapping, Value};
use shared::validate_record_key;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    /// Directory the cluster downloads and unpacks into
    pub work_dir: PathBuf,
    pub component_name: String,
    pub test_config: String,
    pub security_enabled: bool,
    /// Extra settings appended to the primary's configuration file
    pub additional_config: Option<Mapping>,
    /// Ceiling for each wait during escalating termination
    pub termination_timeout: Duration,
    pub host: String,
    pub primary_port: u16,
    pub companion_port: u16,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            component_name: String::new(),
            test_config: String::new(),
            security_enabled: false,
            additional_config: None,
            termination_timeout: Duration::from_secs(10),
            host: "localhost".to_string(),
            primary_port: 9200,
            companion_port: 5601,
        }
    }
}

impl ClusterConfig {
    /// Create a new builder
    pub fn builder() -> ClusterConfigBuilder {
        ClusterConfigBuilder::new()
    }

    pub fn validate(&self) -> ClusterResult<()> {
        validate_record_key("component_name", &self.component_name)
            .and_then(|_| validate_record_key("test_config", &self.test_config))
            .map_err(|e| ClusterError::config(e.to_string()))?;
        if self.termination_timeout.is_zero() {
            return Err(ClusterError::config("termination_timeout must be positive"));
        }
        Ok(())
    }
}

pub struct ClusterConfigBuilder {
    config: ClusterConfig,
}

impl ClusterConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClusterConfig::default(),
        }
    }

    pub fn work_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.work_dir = dir.into();
        self
    }

    /// Set the component under test
    pub fn component<S: Into<String>>(mut self, name: S) -> Self {
        self.config.component_name = name.into();
        self
    }

    /// Set the test configuration name (e.g. `with-security`)
    pub fn test_config<S: Into<String>>(mut self, name: S) -> Self {
        self.config.test_config = name.into();
        self
    }

    pub fn security(mut self, enabled: bool) -> Self {
        self.config.security_enabled = enabled;
        self
    }

    pub fn additional_config(mut self, config: Mapping) -> Self {
        self.config.additional_config = Some(config);
        self
    }

    /// Add a single setting to the additional configuration
    pub fn additional_setting<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.config
            .additional_config
            .get_or_insert_with(Mapping::new)
            .insert(Value::String(key.into()), value.into());
        self
    }

    pub fn termination_timeout(mut self, timeout: Duration) -> Self {
        self.config.termination_timeout = timeout;
        self
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn primary_port(mut self, port: u16) -> Self {
        self.config.primary_port = port;
        self
    }

    pub fn companion_port(mut self, port: u16) -> Self {
        self.config.companion_port = port;
        self
    }

    pub fn build(self) -> ClusterConfig {
        self.config
    }
}

impl Default for ClusterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
