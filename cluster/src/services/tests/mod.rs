//! Service-specific tests
//!
//! Each service has its own test file; shared fixtures live in `common`.

#[cfg(test)]
mod readiness_probe;

#[cfg(test)]
#[path = "../../../tests/common/tarball.rs"]
mod tarball;

// Common test utilities for services
#[cfg(test)]
pub mod common {
    use std::time::Duration;

    pub use super::tarball::build_tarball;

    /// Short poll interval so readiness tests stay fast
    pub const FAST_POLL: Duration = Duration::from_millis(10);
}
