//! Test cluster lifecycle
//!
//! A [`TestCluster`] fetches, configures, starts and probes a primary service
//! and an optional companion, then tears both down and hands one result
//! record to its recorder.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use shared::{logging, service_info, service_warn, ServiceDescriptor, ServiceKind, TestResultRecord, UNKNOWN_EXIT_CODE};

use crate::core::{ClusterConfig, ClusterState, ReadinessPolicy};
use crate::error::{ClusterError, ClusterResult};
use crate::services::process_supervisor::{LaunchCommand, ProcessSupervisor, Termination, STDERR_FILE, STDOUT_FILE};
use crate::services::{ArtifactFetcher, HttpReadinessProbe, SystemProcessTree};
use crate::traits::{ArtifactStore, ProcessTree, ReadinessProbe, RecordOutcome, ResultRecorder};

const WORK_DIR_NAME: &str = "local-test-cluster";
const SECURITY_USERNAME: &str = "admin";
const SECURITY_PASSWORD: &str = "admin";

/// Result of a [`TestCluster::destroy`] call
#[derive(Debug)]
pub enum DestroyOutcome {
    /// The cluster never started anything
    NothingToDestroy,
    /// A previous destroy already completed
    AlreadyDestroyed,
    /// Services were stopped and the record written
    Recorded(RecordOutcome),
}

struct ManagedService {
    descriptor: ServiceDescriptor,
    policy: ReadinessPolicy,
    supervisor: ProcessSupervisor,
    install_path: Option<PathBuf>,
}

impl ManagedService {
    fn new(descriptor: ServiceDescriptor, policy: ReadinessPolicy, tree: Arc<dyn ProcessTree>) -> Self {
        let supervisor = ProcessSupervisor::new(descriptor.product()).with_process_tree(tree);
        Self {
            descriptor,
            policy,
            supervisor,
            install_path: None,
        }
    }

    /// Stop the service; a failed stop still yields whatever output was captured
    async fn stop(&mut self, timeout: std::time::Duration) -> (Termination, Option<ClusterError>) {
        match self.supervisor.terminate(timeout).await {
            Ok(termination) => (termination, None),
            Err(ClusterError::TerminationFailed {
                pid,
                timeout,
                stdout,
                stderr,
            }) => {
                let termination = Termination {
                    exit_code: UNKNOWN_EXIT_CODE,
                    stdout: stdout.clone(),
                    stderr: stderr.clone(),
                };
                let error = ClusterError::TerminationFailed {
                    pid,
                    timeout,
                    stdout,
                    stderr,
                };
                (termination, Some(error))
            }
            Err(e) => {
                let termination = Termination {
                    exit_code: UNKNOWN_EXIT_CODE,
                    stdout: String::new(),
                    stderr: String::new(),
                };
                (termination, Some(e))
            }
        }
    }
}

/// Lifecycle owner for one component/config test run
pub struct TestCluster {
    config: ClusterConfig,
    work_dir: PathBuf,
    state: ClusterState,
    fetcher: ArtifactFetcher,
    probe: Arc<dyn ReadinessProbe>,
    recorder: Arc<dyn ResultRecorder>,
    tree: Arc<dyn ProcessTree>,
    primary: ManagedService,
    companion: Option<ManagedService>,
}

impl TestCluster {
    pub fn new(
        config: ClusterConfig,
        primary: ServiceDescriptor,
        store: Arc<dyn ArtifactStore>,
        recorder: Arc<dyn ResultRecorder>,
    ) -> ClusterResult<Self> {
        config.validate()?;
        if primary.kind() != ServiceKind::Primary {
            return Err(ClusterError::config(format!("{primary} is not a primary service")));
        }

        let mut probe = HttpReadinessProbe::new()?;
        if config.security_enabled {
            probe = probe.with_credentials(SECURITY_USERNAME, SECURITY_PASSWORD);
        }
        let tree: Arc<dyn ProcessTree> = Arc::new(SystemProcessTree::new());

        Ok(Self {
            work_dir: config.work_dir.join(WORK_DIR_NAME),
            config,
            state: ClusterState::Unprovisioned,
            fetcher: ArtifactFetcher::new(store),
            probe: Arc::new(probe),
            recorder,
            primary: ManagedService::new(primary, ReadinessPolicy::primary(), tree.clone()),
            companion: None,
            tree,
        })
    }

    /// Also manage a companion service, started after the primary is ready
    pub fn with_companion(mut self, companion: ServiceDescriptor) -> ClusterResult<Self> {
        if companion.kind() != ServiceKind::Companion {
            return Err(ClusterError::config(format!("{companion} is not a companion service")));
        }
        self.companion = Some(ManagedService::new(companion, ReadinessPolicy::companion(), self.tree.clone()));
        Ok(self)
    }

    pub fn with_readiness_probe(mut self, probe: Arc<dyn ReadinessProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Replace the process table used when stopping services
    pub fn with_process_tree(mut self, tree: Arc<dyn ProcessTree>) -> Self {
        self.primary.supervisor = ProcessSupervisor::new(self.primary.descriptor.product()).with_process_tree(tree.clone());
        if let Some(companion) = &mut self.companion {
            companion.supervisor = ProcessSupervisor::new(companion.descriptor.product()).with_process_tree(tree.clone());
        }
        self.tree = tree;
        self
    }

    pub fn with_primary_policy(mut self, policy: ReadinessPolicy) -> Self {
        self.primary.policy = policy;
        self
    }

    /// Has no effect unless a companion is configured
    pub fn with_companion_policy(mut self, policy: ReadinessPolicy) -> Self {
        if let Some(companion) = &mut self.companion {
            companion.policy = policy;
        }
        self
    }

    pub fn state(&self) -> ClusterState {
        self.state
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn endpoint(&self) -> &str {
        &self.config.host
    }

    pub fn port(&self) -> u16 {
        self.config.primary_port
    }

    /// URL of the primary service; https when security is enabled
    pub fn url(&self, path: &str) -> String {
        let scheme = if self.config.security_enabled { "https" } else { "http" };
        format!("{scheme}://{}:{}{path}", self.config.host, self.config.primary_port)
    }

    pub fn companion_url(&self, path: &str) -> Option<String> {
        self.companion
            .as_ref()
            .map(|_| format!("http://{}:{}{path}", self.config.host, self.config.companion_port))
    }

    pub fn install_path(&self, kind: ServiceKind) -> Option<&Path> {
        self.service(kind).and_then(|service| service.install_path.as_deref())
    }

    pub fn pid(&self, kind: ServiceKind) -> Option<u32> {
        self.service(kind).and_then(|service| service.supervisor.pid())
    }

    fn service(&self, kind: ServiceKind) -> Option<&ManagedService> {
        match kind {
            ServiceKind::Primary => Some(&self.primary),
            ServiceKind::Companion => self.companion.as_ref(),
        }
    }

    fn service_mut(&mut self, kind: ServiceKind) -> ClusterResult<&mut ManagedService> {
        match kind {
            ServiceKind::Primary => Ok(&mut self.primary),
            ServiceKind::Companion => self
                .companion
                .as_mut()
                .ok_or_else(|| ClusterError::config("no companion service configured")),
        }
    }

    fn service_url(&self, kind: ServiceKind) -> String {
        match kind {
            ServiceKind::Primary => self.url(""),
            ServiceKind::Companion => self.companion_url("").unwrap_or_default(),
        }
    }

    /// Fetch, start and probe every managed service
    ///
    /// Any failure moves the cluster to `Failed` and is returned as is.
    /// Services already started stay running until [`TestCluster::destroy`].
    pub async fn create(&mut self) -> ClusterResult<()> {
        if !self.state.can_create() {
            return Err(ClusterError::InvalidState {
                operation: "create".to_string(),
                state: self.state.to_string(),
            });
        }

        logging::log_startup(
            &self.config.component_name,
            &format!("test cluster {} for {}", self.primary.descriptor, self.config.test_config),
        );

        match self.provision().await {
            Ok(()) => {
                self.state = ClusterState::Ready;
                service_info!(self.config.component_name, "✅ Test cluster ready at {}", self.url(""));
                Ok(())
            }
            Err(e) => {
                logging::log_error(&self.config.component_name, &format!("create in state {}", self.state), &e);
                self.state = ClusterState::Failed;
                Err(e)
            }
        }
    }

    async fn provision(&mut self) -> ClusterResult<()> {
        fs::create_dir_all(&self.work_dir).await?;

        self.bring_up(ServiceKind::Primary).await?;
        if self.companion.is_some() {
            self.bring_up(ServiceKind::Companion).await?;
        }
        Ok(())
    }

    async fn bring_up(&mut self, kind: ServiceKind) -> ClusterResult<()> {
        self.state = ClusterState::Fetching;
        let descriptor = self.service_mut(kind)?.descriptor.clone();
        let install_path = self.fetch_install(&descriptor).await?;
        self.service_mut(kind)?.install_path = Some(install_path.clone());

        if kind == ServiceKind::Primary {
            self.patch_config(&descriptor, &install_path).await?;
        }

        self.state = ClusterState::Starting;
        let command = LaunchCommand::new(install_path.join(descriptor.launcher()));
        let url = self.service_url(kind);
        let service = self.service_mut(kind)?;
        service.supervisor.spawn(&command, &install_path)?;
        let policy = service.policy.clone();

        let attempts = self.probe.wait_until_ready(&url, &policy).await?;
        service_info!(descriptor.product(), "✅ {} ready after {} attempt(s)", descriptor, attempts);
        Ok(())
    }

    async fn fetch_install(&self, descriptor: &ServiceDescriptor) -> ClusterResult<PathBuf> {
        let archive = self.fetcher.fetch(descriptor.location(), &self.work_dir).await?;

        let install_path = self.work_dir.join(descriptor.install_dir());
        if !install_path.is_dir() {
            return Err(ClusterError::unpack(
                archive,
                format!("expected install directory {} not found", install_path.display()),
            ));
        }
        Ok(install_path)
    }

    /// Append test settings to the primary's configuration file
    async fn patch_config(&self, descriptor: &ServiceDescriptor, install_path: &Path) -> ClusterResult<()> {
        let mut patch = String::new();
        if !self.config.security_enabled {
            patch.push_str("\nplugins.security.disabled: true\n");
        }
        if let Some(additional) = &self.config.additional_config {
            patch.push('\n');
            patch.push_str(&serde_yaml::to_string(additional)?);
        }
        if patch.is_empty() {
            return Ok(());
        }

        let config_file = install_path.join("config").join(format!("{}.yml", descriptor.product()));
        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&config_file).await?;
        file.write_all(patch.as_bytes()).await?;
        file.flush().await?;

        service_info!(descriptor.product(), "🔧 Patched {}", config_file.display());
        Ok(())
    }

    /// Stop the companion then the primary and record the outcome
    ///
    /// Recording is attempted even when a termination fails; the first
    /// termination failure is returned afterwards.
    pub async fn destroy(&mut self) -> ClusterResult<DestroyOutcome> {
        match self.state {
            ClusterState::Unprovisioned => {
                service_info!(self.config.component_name, "Nothing to destroy, cluster was never created");
                return Ok(DestroyOutcome::NothingToDestroy);
            }
            ClusterState::Destroyed => return Ok(DestroyOutcome::AlreadyDestroyed),
            _ => {}
        }

        let companion_running = self.companion.as_ref().is_some_and(|c| c.supervisor.is_running());
        if !self.primary.supervisor.is_running() && !companion_running {
            service_info!(self.config.component_name, "Nothing to destroy in state {}", self.state);
            self.state = ClusterState::Destroyed;
            return Ok(DestroyOutcome::NothingToDestroy);
        }

        self.state = ClusterState::Destroying;
        let timeout = self.config.termination_timeout;
        let mut first_failure = None;

        let mut companion_output = None;
        if let Some(companion) = self.companion.as_mut().filter(|c| c.supervisor.is_running()) {
            let (termination, failure) = companion.stop(timeout).await;
            first_failure = first_failure.or(failure);
            companion_output = Some((companion.descriptor.clone(), termination));
        }

        let primary_termination = if self.primary.supervisor.is_running() {
            let (termination, failure) = self.primary.stop(timeout).await;
            first_failure = first_failure.or(failure);
            termination
        } else {
            Termination {
                exit_code: UNKNOWN_EXIT_CODE,
                stdout: String::new(),
                stderr: String::new(),
            }
        };

        let mut record = TestResultRecord::new(
            self.config.component_name.clone(),
            self.config.test_config.clone(),
            primary_termination.exit_code,
        )
        .with_output(primary_termination.stdout, primary_termination.stderr);

        if let Some(install_path) = &self.primary.install_path {
            record = record.with_log_dir(
                format!("{}-service-logs", self.primary.descriptor.product()),
                install_path.join("logs"),
            );
        }
        if let Some((descriptor, termination)) = companion_output {
            match self.save_companion_output(&descriptor, &termination).await {
                Ok(dir) => record = record.with_log_dir(format!("{}-output", descriptor.product()), dir),
                Err(e) => {
                    service_warn!(descriptor.product(), "⚠️ Failed to save companion output: {}", e);
                }
            }
        }

        let recorded = self.recorder.record(&record).await;
        self.state = if first_failure.is_some() {
            ClusterState::Failed
        } else {
            ClusterState::Destroyed
        };

        if let Some(failure) = first_failure {
            if let Err(e) = &recorded {
                logging::log_error(&self.recorder.name(), "record", e);
            }
            return Err(failure);
        }

        let outcome = recorded?;
        service_info!(
            self.config.component_name,
            "🧹 Test cluster destroyed, {} recorded to {}",
            self.recorder.name(),
            outcome.location.display()
        );
        Ok(DestroyOutcome::Recorded(outcome))
    }

    async fn save_companion_output(&self, descriptor: &ServiceDescriptor, termination: &Termination) -> ClusterResult<PathBuf> {
        let dir = self.work_dir.join(format!("{}-output", descriptor.install_dir()));
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(STDOUT_FILE), &termination.stdout).await?;
        fs::write(dir.join(STDERR_FILE), &termination.stderr).await?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockArtifactStore, MockResultRecorder};

    fn config() -> ClusterConfig {
        ClusterConfig::builder()
            .work_dir("/tmp/integ")
            .component("sql")
            .test_config("with_security")
            .build()
    }

    fn cluster(config: ClusterConfig) -> TestCluster {
        let primary = ServiceDescriptor::primary("1.1.0", "x64", "1234").unwrap();
        TestCluster::new(config, primary, Arc::new(MockArtifactStore::new()), Arc::new(MockResultRecorder::new())).unwrap()
    }

    #[test]
    fn test_endpoints_follow_security_setting() {
        let plain = cluster(config());
        assert_eq!(plain.url("/_cluster/health"), "http://localhost:9200/_cluster/health");
        assert_eq!(plain.endpoint(), "localhost");
        assert_eq!(plain.port(), 9200);
        assert_eq!(plain.companion_url(""), None);

        let mut secure_config = config();
        secure_config.security_enabled = true;
        assert_eq!(cluster(secure_config).url(""), "https://localhost:9200");
    }

    #[test]
    fn test_companion_url_is_always_plain_http() {
        let mut secure_config = config();
        secure_config.security_enabled = true;
        let companion = ServiceDescriptor::companion("1.1.0", "x64", "1234").unwrap();

        let cluster = cluster(secure_config).with_companion(companion).unwrap();
        assert_eq!(cluster.companion_url("/api/status").as_deref(), Some("http://localhost:5601/api/status"));
    }

    #[test]
    fn test_work_dir_is_nested_under_configured_dir() {
        let cluster = cluster(config());
        assert_eq!(cluster.work_dir(), Path::new("/tmp/integ/local-test-cluster"));
        assert_eq!(cluster.state(), ClusterState::Unprovisioned);
    }

    #[test]
    fn test_descriptor_roles_are_checked() {
        let companion = ServiceDescriptor::companion("1.1.0", "x64", "1234").unwrap();
        let primary = ServiceDescriptor::primary("1.1.0", "x64", "1234").unwrap();

        let as_primary = TestCluster::new(
            config(),
            companion,
            Arc::new(MockArtifactStore::new()),
            Arc::new(MockResultRecorder::new()),
        );
        assert!(matches!(as_primary, Err(ClusterError::ConfigurationError { .. })));

        let as_companion = cluster(config()).with_companion(primary);
        assert!(matches!(as_companion, Err(ClusterError::ConfigurationError { .. })));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let primary = ServiceDescriptor::primary("1.1.0", "x64", "1234").unwrap();
        let result = TestCluster::new(
            ClusterConfig::default(),
            primary,
            Arc::new(MockArtifactStore::new()),
            Arc::new(MockResultRecorder::new()),
        );

        assert!(matches!(result, Err(ClusterError::ConfigurationError { .. })));
    }
}
