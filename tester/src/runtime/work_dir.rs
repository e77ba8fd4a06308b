//! Cluster Work Directory
//!
//! The work directory is either given on the command line or a temporary
//! directory that is removed at the end of the run unless kept.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct WorkDir {
    path: PathBuf,
    temp: Option<TempDir>,
}

impl WorkDir {
    pub fn prepare(configured: Option<&Path>, keep: bool) -> Result<Self> {
        if let Some(dir) = configured {
            std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
            return Ok(Self {
                path: dir.to_path_buf(),
                temp: None,
            });
        }

        let temp = tempfile::Builder::new()
            .prefix("integ-test-")
            .tempdir()
            .context("failed to create temporary work directory")?;

        if keep {
            let path = temp.keep();
            tracing::info!("📂 Keeping work directory {}", path.display());
            Ok(Self { path, temp: None })
        } else {
            Ok(Self {
                path: temp.path().to_path_buf(),
                temp: Some(temp),
            })
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Remove the directory if it is temporary
    pub fn close(self) -> Result<()> {
        if let Some(temp) = self.temp {
            tracing::debug!("🧹 Removing work directory {}", temp.path().display());
            temp.close().context("failed to remove work directory")?;
        }
        Ok(())
    }
}
