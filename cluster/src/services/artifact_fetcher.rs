//! Downloads a service distribution and unpacks it into a destination directory

use async_compression::tokio::bufread::GzipDecoder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::BufReader;
use tokio_tar::Archive;

use crate::error::{ClusterError, ClusterResult};
use crate::traits::ArtifactStore;

pub struct ArtifactFetcher {
    store: Arc<dyn ArtifactStore>,
}

impl ArtifactFetcher {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Fetch `location` into `destination` and unpack it there
    ///
    /// Returns the path of the downloaded archive. Re-fetching into the same
    /// destination overwrites both the archive and the extracted tree.
    pub async fn fetch(&self, location: &str, destination: &Path) -> ClusterResult<PathBuf> {
        let file_name = Path::new(location)
            .file_name()
            .ok_or_else(|| ClusterError::unavailable(location, "location does not name a file"))?;

        fs::create_dir_all(destination).await?;

        let bytes = self.store.fetch(location).await?;
        let archive_path = destination.join(file_name);
        fs::write(&archive_path, &bytes)
            .await
            .map_err(|e| ClusterError::unavailable(location, format!("failed to store archive: {e}")))?;
        tracing::info!("📦 Downloaded {} to {}", location, archive_path.display());

        unpack(&archive_path, destination).await?;
        tracing::info!("📂 Unpacked {} into {}", archive_path.display(), destination.display());

        Ok(archive_path)
    }
}

/// Extract a gzip-compressed tarball into `destination`
pub async fn unpack(archive: &Path, destination: &Path) -> ClusterResult<()> {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if !(name.ends_with(".tar.gz") || name.ends_with(".tgz")) {
        return Err(ClusterError::unpack(archive, "unsupported archive format"));
    }

    let file = File::open(archive).await.map_err(|e| ClusterError::unpack(archive, e))?;
    let mut tarball = Archive::new(GzipDecoder::new(BufReader::new(file)));
    tarball
        .unpack(destination)
        .await
        .map_err(|e| ClusterError::unpack(archive, e))
}
