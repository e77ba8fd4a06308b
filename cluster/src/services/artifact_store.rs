//! Artifact store adapters
//!
//! A location descriptor is a relative, path-like string. The local store
//! resolves it under a directory root; the HTTP store resolves it against a
//! base URL.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use url::Url;

use crate::error::{ClusterError, ClusterResult};
use crate::traits::ArtifactStore;

/// Artifact store backed by a local directory
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn fetch(&self, location: &str) -> ClusterResult<Vec<u8>> {
        let path = self.root.join(location.trim_start_matches('/'));
        tracing::debug!("📦 Reading artifact {}", path.display());

        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ClusterError::unavailable(location, format!("not found under {}", self.root.display())))
            }
            Err(e) => Err(ClusterError::unavailable(location, e)),
        }
    }
}

/// Artifact store reachable over HTTP(S)
pub struct HttpArtifactStore {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpArtifactStore {
    pub fn new(base_url: &str) -> ClusterResult<Self> {
        // Url::join drops the last segment unless the base ends with '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| ClusterError::config(format!("invalid artifact URL {base_url}: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| ClusterError::config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { base_url, client })
    }
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn fetch(&self, location: &str) -> ClusterResult<Vec<u8>> {
        let url = self
            .base_url
            .join(location.trim_start_matches('/'))
            .map_err(|e| ClusterError::unavailable(location, e))?;
        tracing::info!("📥 Downloading {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ClusterError::unavailable(location, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClusterError::unavailable(location, format!("{url} not found")));
        }
        if !status.is_success() {
            return Err(ClusterError::unavailable(location, format!("HTTP {status} from {url}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClusterError::unavailable(location, e))?;
        tracing::debug!("📥 Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

/// Pick a store for an artifact source: an http(s) URL or a local directory
pub fn artifact_store_for(source: &str) -> ClusterResult<Arc<dyn ArtifactStore>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        Ok(Arc::new(HttpArtifactStore::new(source)?))
    } else {
        Ok(Arc::new(LocalArtifactStore::new(source)))
    }
}
