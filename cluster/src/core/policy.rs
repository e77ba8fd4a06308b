//! Readiness policies for managed services

use serde_json::Value;
use std::time::Duration;

/// Additional check applied to the response body once the status matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyCheck {
    /// Status code alone decides
    None,
    /// Parse a cluster health document and inspect its `status` field
    ClusterHealth { accept_yellow: bool },
}

impl BodyCheck {
    pub fn accepts(&self, body: &str) -> bool {
        match self {
            BodyCheck::None => true,
            BodyCheck::ClusterHealth { accept_yellow } => {
                let Ok(document) = serde_json::from_str::<Value>(body) else {
                    return false;
                };
                match document.get("status").and_then(Value::as_str) {
                    Some("green") => true,
                    Some("yellow") => *accept_yellow,
                    _ => false,
                }
            }
        }
    }
}

/// How to decide that a service answers its health endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub path: String,
    pub expected_status: u16,
    pub body_check: BodyCheck,
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl ReadinessPolicy {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

    pub fn new<S: Into<String>>(path: S) -> Self {
        Self {
            path: path.into(),
            expected_status: 200,
            body_check: BodyCheck::None,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Cluster health of the search engine node; yellow is usable for tests
    pub fn primary() -> Self {
        Self::new("/_cluster/health").with_body_check(BodyCheck::ClusterHealth { accept_yellow: true })
    }

    /// Status endpoint of the UI companion
    pub fn companion() -> Self {
        Self::new("/api/status")
    }

    pub fn with_expected_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    pub fn with_body_check(mut self, check: BodyCheck) -> Self {
        self.body_check = check;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn is_ready(&self, status: u16, body: &str) -> bool {
        status == self.expected_status && self.body_check.accepts(body)
    }
}
