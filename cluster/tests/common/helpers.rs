//! Test helpers and builder patterns for cluster tests

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use cluster::traits::MockReadinessProbe;
use cluster::*;
use shared::{OutcomeSummary, RunContext, ServiceDescriptor};

use super::fixtures::TestFixtures;

/// Which recorder the cluster hands its record to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderRole {
    LocalCluster,
    TestResults,
}

/// Real process table that remembers which pids were sent SIGTERM, in order
pub struct RecordingProcessTree {
    system: SystemProcessTree,
    terminated: Mutex<Vec<u32>>,
}

impl RecordingProcessTree {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            system: SystemProcessTree::new(),
            terminated: Mutex::new(Vec::new()),
        })
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.terminated.lock().unwrap().clone()
    }
}

impl ProcessTree for RecordingProcessTree {
    fn descendants(&self, pid: u32) -> Vec<u32> {
        self.system.descendants(pid)
    }

    fn terminate(&self, pid: u32) -> ClusterResult<()> {
        self.terminated.lock().unwrap().push(pid);
        self.system.terminate(pid)
    }

    fn kill(&self, pid: u32) -> ClusterResult<()> {
        self.system.kill(pid)
    }
}

/// A built cluster plus the temporary directories it lives in
pub struct ClusterHarness {
    pub cluster: TestCluster,
    pub artifacts: TempDir,
    pub work: TempDir,
    pub results: TempDir,
}

impl ClusterHarness {
    /// `<results>/<run>/<type>/<component>/<config>`
    pub fn result_leaf(&self) -> PathBuf {
        RunContext::new(TestFixtures::RUN_ID, TestFixtures::TEST_TYPE, self.results.path())
            .result_dir(TestFixtures::COMPONENT, TestFixtures::TEST_CONFIG)
            .unwrap()
    }
}

/// Builder for test clusters backed by a local artifact directory
pub struct ClusterBuilder {
    config: ClusterConfigBuilder,
    probe: Arc<dyn ReadinessProbe>,
    tree: Option<Arc<dyn ProcessTree>>,
    recorder: RecorderRole,
    companion: bool,
    publish: bool,
}

impl ClusterBuilder {
    pub fn new() -> Self {
        Self {
            config: ClusterConfig::builder()
                .component(TestFixtures::COMPONENT)
                .test_config(TestFixtures::TEST_CONFIG)
                .termination_timeout(Duration::from_secs(5)),
            probe: TestHelpers::always_ready(),
            tree: None,
            recorder: RecorderRole::LocalCluster,
            companion: false,
            publish: true,
        }
    }

    pub fn with_config<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(ClusterConfigBuilder) -> ClusterConfigBuilder,
    {
        self.config = setup(self.config);
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn ReadinessProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_process_tree(mut self, tree: Arc<dyn ProcessTree>) -> Self {
        self.tree = Some(tree);
        self
    }

    pub fn with_recorder(mut self, role: RecorderRole) -> Self {
        self.recorder = role;
        self
    }

    pub fn with_companion(mut self) -> Self {
        self.companion = true;
        self
    }

    /// Leave the artifact directory empty
    pub fn without_artifacts(mut self) -> Self {
        self.publish = false;
        self
    }

    pub async fn build(self) -> ClusterHarness {
        let artifacts = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let results = TempDir::new().unwrap();

        if self.publish {
            TestHelpers::publish(artifacts.path(), &TestFixtures::primary(), TestFixtures::primary_tarball().await);
            TestHelpers::publish(artifacts.path(), &TestFixtures::companion(), TestFixtures::companion_tarball().await);
        }

        let run = RunContext::new(TestFixtures::RUN_ID, TestFixtures::TEST_TYPE, results.path());
        let recorder: Arc<dyn ResultRecorder> = match self.recorder {
            RecorderRole::LocalCluster => Arc::new(LocalClusterRecorder::new(run)),
            RecorderRole::TestResults => Arc::new(TestResultsRecorder::new(run)),
        };

        let config = self.config.work_dir(work.path()).build();
        let store = Arc::new(LocalArtifactStore::new(artifacts.path()));

        let mut cluster = TestCluster::new(config, TestFixtures::primary(), store, recorder).unwrap();
        if self.companion {
            cluster = cluster.with_companion(TestFixtures::companion()).unwrap();
        }
        if let Some(tree) = self.tree {
            cluster = cluster.with_process_tree(tree);
        }
        let cluster = cluster.with_readiness_probe(self.probe);

        ClusterHarness {
            cluster,
            artifacts,
            work,
            results,
        }
    }
}

impl Default for ClusterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Test helper functions for common operations
pub struct TestHelpers;

impl TestHelpers {
    /// Place a distribution where the local store will look for it
    pub fn publish(root: &Path, descriptor: &ServiceDescriptor, bytes: Vec<u8>) {
        let path = root.join(descriptor.location());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    /// Probe that reports every service ready on the first attempt
    pub fn always_ready() -> Arc<dyn ReadinessProbe> {
        let mut probe = MockReadinessProbe::new();
        probe.expect_wait_until_ready().returning(|_, _| Ok(1));
        Arc::new(probe)
    }

    /// Primary ready, companion never answers
    pub fn companion_never_ready() -> Arc<dyn ReadinessProbe> {
        let mut probe = MockReadinessProbe::new();
        probe
            .expect_wait_until_ready()
            .withf(|url, _| url.ends_with(":9200"))
            .returning(|_, _| Ok(1));
        probe
            .expect_wait_until_ready()
            .withf(|url, _| url.ends_with(":5601"))
            .returning(|url, policy| {
                Err(ClusterError::ClusterNotAvailable {
                    url: format!("{url}{}", policy.path),
                    attempts: policy.max_attempts,
                })
            });
        Arc::new(probe)
    }

    /// Give launched scripts time to print their banner
    pub async fn settle() {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    pub fn read_summary(path: &Path) -> OutcomeSummary {
        serde_yaml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    pub fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()))
    }
}
