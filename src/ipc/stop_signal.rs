//! Stop sentinel
//!
//! Cancellation is requested by creating an empty file. Its content is never
//! read.

use std::path::{Path, PathBuf};

use tracing::info;

use super::{IpcError, remove_if_exists};

#[derive(Debug, Clone)]
pub struct StopSignal {
    path: PathBuf,
}

impl StopSignal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn request(&self) -> Result<(), IpcError> {
        std::fs::File::create(&self.path).map_err(|e| IpcError::io(&self.path, e))?;
        info!("Stop requested via {}", self.path.display());
        Ok(())
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.path.exists()
    }

    pub fn clear(&self) -> Result<(), IpcError> {
        remove_if_exists(&self.path)
    }
}
