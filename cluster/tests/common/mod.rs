//! Common test utilities and infrastructure
//!
//! Shared fixtures and helpers used across the cluster integration suites.

pub mod fixtures;
pub mod helpers;
pub mod tarball;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use helpers::{ClusterBuilder, TestHelpers};
