//! Core shared types: service descriptors, run context and result records

use crate::errors::{SharedError, SharedResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Exit code recorded when a process could not be stopped and its status is unknown
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// Role of a managed service within a test cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// The search engine node every cluster runs
    Primary,
    /// Optional UI service started once the primary is ready
    Companion,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Primary => write!(f, "primary"),
            ServiceKind::Companion => write!(f, "companion"),
        }
    }
}

/// Identifies one manageable service and where its distribution lives
///
/// Immutable once built: the location descriptor, install directory and
/// launcher are all derived from product, version and architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    kind: ServiceKind,
    product: String,
    version: String,
    architecture: String,
    build_id: String,
    location: String,
    install_dir: String,
    launcher: PathBuf,
}

impl ServiceDescriptor {
    pub const PRIMARY_PRODUCT: &'static str = "opensearch";
    pub const COMPANION_PRODUCT: &'static str = "opensearch-dashboards";

    pub fn new(
        kind: ServiceKind,
        product: &str,
        version: &str,
        architecture: &str,
        build_id: &str,
    ) -> SharedResult<Self> {
        for (field, value) in [
            ("product", product),
            ("version", version),
            ("architecture", architecture),
            ("build_id", build_id),
        ] {
            if value.trim().is_empty() {
                return Err(SharedError::InvalidDescriptor {
                    message: format!("{field} must not be empty"),
                });
            }
            if value.contains('/') {
                return Err(SharedError::InvalidDescriptor {
                    message: format!("{field} must not contain '/': {value}"),
                });
            }
        }

        let tarball = tarball_name(product, version, architecture);
        let location = format!("{build_id}/{product}/{version}/{architecture}/{tarball}");
        let install_dir = match kind {
            ServiceKind::Primary => format!("{product}-{version}"),
            ServiceKind::Companion => format!("{product}-{version}-linux-{architecture}"),
        };
        let launcher = match kind {
            ServiceKind::Primary => PathBuf::from("opensearch-tar-install.sh"),
            ServiceKind::Companion => PathBuf::from("bin").join("opensearch-dashboards"),
        };

        Ok(Self {
            kind,
            product: product.to_string(),
            version: version.to_string(),
            architecture: architecture.to_string(),
            build_id: build_id.to_string(),
            location,
            install_dir,
            launcher,
        })
    }

    /// Descriptor for the search engine node
    pub fn primary(version: &str, architecture: &str, build_id: &str) -> SharedResult<Self> {
        Self::new(ServiceKind::Primary, Self::PRIMARY_PRODUCT, version, architecture, build_id)
    }

    /// Descriptor for the UI companion service
    pub fn companion(version: &str, architecture: &str, build_id: &str) -> SharedResult<Self> {
        Self::new(ServiceKind::Companion, Self::COMPANION_PRODUCT, version, architecture, build_id)
    }

    /// Override the launcher path, relative to the install directory
    pub fn with_launcher<P: Into<PathBuf>>(mut self, launcher: P) -> Self {
        self.launcher = launcher.into();
        self
    }

    /// Override the location descriptor handed to the artifact store
    pub fn with_location<S: Into<String>>(mut self, location: S) -> Self {
        self.location = location.into();
        self
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    pub fn build_id(&self) -> &str {
        &self.build_id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn install_dir(&self) -> &str {
        &self.install_dir
    }

    pub fn launcher(&self) -> &Path {
        &self.launcher
    }
}

impl fmt::Display for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} ({})", self.product, self.version, self.architecture)
    }
}

/// File name of a distribution tarball
pub fn tarball_name(product: &str, version: &str, architecture: &str) -> String {
    format!("{product}-{version}-linux-{architecture}.tar.gz")
}

/// On-disk namespace for every result recorded during one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub run_id: u64,
    pub test_type: String,
    pub base_dir: PathBuf,
}

impl RunContext {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(run_id: u64, test_type: S, base_dir: P) -> Self {
        Self {
            run_id,
            test_type: test_type.into(),
            base_dir: base_dir.into(),
        }
    }

    /// `<base>/<run_id>/<test_type>`
    pub fn location(&self) -> PathBuf {
        self.base_dir.join(self.run_id.to_string()).join(&self.test_type)
    }

    /// `<base>/<run_id>/<test_type>/<component>/<test_config>`
    pub fn result_dir(&self, component_name: &str, test_config: &str) -> SharedResult<PathBuf> {
        validate_record_key("component_name", component_name)?;
        validate_record_key("test_config", test_config)?;
        Ok(self.location().join(component_name).join(test_config))
    }
}

/// A record key must name exactly one directory level under its parent
pub fn validate_record_key(field: &str, value: &str) -> SharedResult<()> {
    let reason = if value.trim().is_empty() {
        Some("must not be empty")
    } else if value.contains('/') || value.contains('\\') {
        Some("must not contain a path separator")
    } else if value == "." || value == ".." {
        Some("must not be a relative path component")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SharedError::InvalidRecordKey {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Captured outcome of one component/config test execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResultRecord {
    pub component_name: String,
    pub test_config: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Logical destination name -> source log directory
    pub log_dirs: BTreeMap<String, PathBuf>,
}

impl TestResultRecord {
    pub fn new(component_name: impl Into<String>, test_config: impl Into<String>, exit_code: i32) -> Self {
        Self {
            component_name: component_name.into(),
            test_config: test_config.into(),
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
            log_dirs: BTreeMap::new(),
        }
    }

    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }

    pub fn with_log_dir<S: Into<String>, P: Into<PathBuf>>(mut self, name: S, source: P) -> Self {
        self.log_dirs.insert(name.into(), source.into());
        self
    }
}

/// Structured summary written next to every recorded outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    pub test_type: String,
    pub test_run_id: u64,
    pub component_name: String,
    pub test_config: String,
    pub exit_code: i32,
}

impl OutcomeSummary {
    pub fn new(run: &RunContext, record: &TestResultRecord) -> Self {
        Self {
            test_type: run.test_type.clone(),
            test_run_id: run.run_id,
            component_name: record.component_name.clone(),
            test_config: record.test_config.clone(),
            exit_code: record.exit_code,
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
