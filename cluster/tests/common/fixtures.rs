//! Test fixtures: descriptors, run identity and distribution tarballs

use super::tarball::build_tarball;
use shared::ServiceDescriptor;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const VERSION: &'static str = "1.1.0";
    pub const ARCH: &'static str = "x64";
    pub const BUILD_ID: &'static str = "1234";

    pub const COMPONENT: &'static str = "sql";
    pub const TEST_CONFIG: &'static str = "security_disabled";
    pub const RUN_ID: u64 = 7;
    pub const TEST_TYPE: &'static str = "integ-test";

    /// Printed by the primary launcher before it blocks
    pub const PRIMARY_BANNER: &'static str = "started\n";
    /// Printed by the companion launcher before it blocks
    pub const COMPANION_BANNER: &'static str = "dashboards\n";
    pub const PRIMARY_LOG: &'static str = "node started\n";

    pub fn primary() -> ServiceDescriptor {
        ServiceDescriptor::primary(Self::VERSION, Self::ARCH, Self::BUILD_ID).unwrap()
    }

    pub fn companion() -> ServiceDescriptor {
        ServiceDescriptor::companion(Self::VERSION, Self::ARCH, Self::BUILD_ID).unwrap()
    }

    /// Distribution with a launcher that prints a banner and sleeps
    pub async fn primary_tarball() -> Vec<u8> {
        let launcher = format!("#!/bin/sh\necho '{}'\nexec sleep 60\n", Self::PRIMARY_BANNER.trim_end());
        build_tarball(&[
            ("opensearch-1.1.0/opensearch-tar-install.sh", launcher.as_bytes(), 0o755),
            ("opensearch-1.1.0/config/opensearch.yml", b"cluster.name: integ\n", 0o644),
            ("opensearch-1.1.0/logs/opensearch.log", Self::PRIMARY_LOG.as_bytes(), 0o644),
        ])
        .await
    }

    pub async fn companion_tarball() -> Vec<u8> {
        let launcher = format!("#!/bin/sh\necho '{}'\nexec sleep 60\n", Self::COMPANION_BANNER.trim_end());
        build_tarball(&[(
            "opensearch-dashboards-1.1.0-linux-x64/bin/opensearch-dashboards",
            launcher.as_bytes(),
            0o755,
        )])
        .await
    }
}
