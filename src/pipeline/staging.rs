//! Temporary on-disk staging of uploads.
//!
//! Each accepted upload is written to `<dir>/files-<id><ext>` where `<id>`
//! combines a millisecond timestamp with a random UUID, so concurrent
//! requests can share one directory without locking. A [`StagedFile`] owns
//! its path and removes it exactly once: through [`StagedFile::release`] on
//! the normal path, or from `Drop` when processing is abandoned.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Failed to prepare staging directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stage {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Generate an identifier unique within the lifetime of the process.
pub fn new_staging_id() -> String {
    format!(
        "{}-{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    )
}

/// Directory that holds staged uploads.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Create the directory if needed and resolve it to an absolute path.
    pub async fn prepare(dir: impl AsRef<Path>) -> Result<Self, StagingError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| StagingError::Prepare {
                path: dir.to_path_buf(),
                source,
            })?;
        let dir = tokio::fs::canonicalize(dir)
            .await
            .map_err(|source| StagingError::Prepare {
                path: dir.to_path_buf(),
                source,
            })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a file with this identifier and extension is staged at.
    pub fn path_for(&self, staging_id: &str, extension: &str) -> PathBuf {
        self.dir.join(format!("files-{staging_id}{extension}"))
    }

    /// Write `content` to the staging area.
    pub async fn stage(
        &self,
        staging_id: &str,
        extension: &str,
        content: &[u8],
    ) -> Result<StagedFile, StagingError> {
        let path = self.path_for(staging_id, extension);
        if let Err(source) = tokio::fs::write(&path, content).await {
            // A partial write may have left the file behind.
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove partially staged file");
                }
            }
            return Err(StagingError::Write { path, source });
        }
        tracing::debug!(path = %path.display(), bytes = content.len(), "Staged upload");
        Ok(StagedFile {
            path,
            released: false,
        })
    }
}

/// A staged upload on disk. Removed when released or dropped.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    released: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged file. Failures are logged, never returned.
    pub async fn release(mut self) {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Released staged file"),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to release staged file");
            }
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to release abandoned staged file");
            }
        }
    }
}
