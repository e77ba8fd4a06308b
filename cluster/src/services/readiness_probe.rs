//! HTTP readiness polling

use async_trait::async_trait;
use std::time::Duration;

use crate::core::ReadinessPolicy;
use crate::error::{ClusterError, ClusterResult};
use crate::traits::ReadinessProbe;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Polls a service's health endpoint with a bounded number of attempts
///
/// Test clusters run with self-signed certificates, so certificate
/// validation is disabled for every request.
#[derive(Clone)]
pub struct HttpReadinessProbe {
    client: reqwest::Client,
    credentials: Option<(String, String)>,
}

impl HttpReadinessProbe {
    pub fn new() -> ClusterResult<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClusterError::config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            credentials: None,
        })
    }

    /// Send basic auth with every request
    pub fn with_credentials<U: Into<String>, P: Into<String>>(mut self, username: U, password: P) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    async fn check(&self, endpoint: &str, policy: &ReadinessPolicy) -> Result<bool, String> {
        let mut request = self.client.get(endpoint);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| e.to_string())?;

        if policy.is_ready(status, &body) {
            Ok(true)
        } else {
            tracing::debug!("Endpoint {} answered {} with body: {}", endpoint, status, body);
            Ok(false)
        }
    }
}

#[async_trait]
impl ReadinessProbe for HttpReadinessProbe {
    async fn wait_until_ready(&self, url: &str, policy: &ReadinessPolicy) -> ClusterResult<u32> {
        let endpoint = format!("{}{}", url.trim_end_matches('/'), policy.path);
        tracing::info!("⏳ Waiting for {} to become ready", endpoint);

        for attempt in 1..=policy.max_attempts {
            match self.check(&endpoint, policy).await {
                Ok(true) => {
                    tracing::info!("✅ {} is ready after {} attempt(s)", endpoint, attempt);
                    return Ok(attempt);
                }
                Ok(false) => {
                    tracing::info!("Attempt {}/{}: {} is not ready yet", attempt, policy.max_attempts, endpoint);
                }
                Err(reason) => {
                    tracing::info!("Attempt {}/{}: {} unreachable: {}", attempt, policy.max_attempts, endpoint, reason);
                }
            }
            tokio::time::sleep(policy.poll_interval).await;
        }

        Err(ClusterError::ClusterNotAvailable {
            url: endpoint,
            attempts: policy.max_attempts,
        })
    }
}
