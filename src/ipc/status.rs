//! Run status document

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, error};

use super::{IpcError, remove_if_exists};
use crate::crawl_engine::StatusReporter;

/// Lifecycle state of a worker run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Starting,
    Running,
    Completed,
    Stopped,
    Error,
}

impl RunState {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Error)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub status: RunState,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub jobs_scraped: u32,
    #[serde(default = "first_page")]
    pub current_page: u32,
    pub timestamp: DateTime<Local>,
    pub pid: u32,
}

fn first_page() -> u32 {
    1
}

impl RunStatus {
    /// Status stamped with the current time and this process's pid.
    pub fn new(status: RunState, message: impl Into<String>, jobs_scraped: u32, current_page: u32) -> Self {
        Self {
            status,
            message: message.into(),
            jobs_scraped,
            current_page,
            timestamp: Local::now(),
            pid: std::process::id(),
        }
    }

    /// Same observable state, ignoring the timestamp.
    #[must_use]
    pub fn same_state(&self, other: &Self) -> bool {
        self.status == other.status
            && self.message == other.message
            && self.jobs_scraped == other.jobs_scraped
            && self.current_page == other.current_page
            && self.pid == other.pid
    }
}

/// The status file at a fixed path.
#[derive(Debug, Clone)]
pub struct StatusFile {
    path: PathBuf,
}

impl StatusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the whole document. Written to a sibling temp file and renamed,
    /// so a reader never sees a partial document.
    pub fn write(&self, status: &RunStatus) -> Result<(), IpcError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| IpcError::io(dir, e))?;
        let json = serde_json::to_vec_pretty(status)?;
        tmp.write_all(&json)
            .and_then(|()| tmp.flush())
            .map_err(|e| IpcError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| IpcError::io(&self.path, e.error))?;
        Ok(())
    }

    /// `None` when the file is missing, empty or not a status document.
    #[must_use]
    pub fn read(&self) -> Option<RunStatus> {
        let raw = std::fs::read(&self.path).ok()?;
        if raw.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        match serde_json::from_slice(&raw) {
            Ok(status) => Some(status),
            Err(e) => {
                debug!("Ignoring unreadable status file {}: {e}", self.path.display());
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), IpcError> {
        remove_if_exists(&self.path)
    }
}

impl StatusReporter for StatusFile {
    fn report(&self, state: RunState, message: &str, jobs_scraped: u32, current_page: u32) {
        let status = RunStatus::new(state, message, jobs_scraped, current_page);
        if let Err(e) = self.write(&status) {
            error!("Error updating status file: {:#}", anyhow::Error::from(e));
        }
    }
}
