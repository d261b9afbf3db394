use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::WriteError;

/// Destination for rendered files.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Write `contents` to `relative_path`, replacing any existing file.
    async fn write(&self, relative_path: &Path, contents: &str) -> Result<(), WriteError>;
}

/// Writes files under a root directory, creating parents as needed.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl OutputSink for FsSink {
    async fn write(&self, relative_path: &Path, contents: &str) -> Result<(), WriteError> {
        let path = self.root.join(relative_path);
        let io_err = |source| WriteError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&path, contents).await.map_err(io_err)?;
        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }
}
