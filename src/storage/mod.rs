//! Storage collaborator for scraped postings
//!
//! The supervisor forwards every job-stream line through [`JobStore::insert`].
//! Uniqueness on (title, company) absorbs the at-least-once delivery of the
//! stream, so re-forwarding a line is harmless.

pub mod sqlite;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use crate::job::JobPosting;

pub use sqlite::SqliteJobStore;

const DATABASE_FILE: &str = "jobs.sqlite";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result of inserting one posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted { id: i64 },
    /// A posting with the same title and company is already stored.
    Duplicate,
}

/// A stored posting as listed for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredJob {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub posted_at: Option<String>,
    pub link: Option<String>,
    pub job_type: Option<String>,
    pub description: Option<String>,
    /// User-assigned review status, if any.
    pub status: Option<String>,
    pub is_new: bool,
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: &JobPosting) -> Result<InsertOutcome, StorageError>;

    /// Unseen postings first, then newest first. `None` lists everything.
    async fn list(&self, limit: Option<u32>) -> Result<Vec<StoredJob>, StorageError>;

    /// Returns false when no posting has this id.
    async fn mark_seen(&self, id: i64) -> Result<bool, StorageError>;

    /// Set or clear the review status. Setting a status also marks the
    /// posting seen.
    async fn set_status(&self, id: i64, status: Option<&str>) -> Result<bool, StorageError>;

    async fn delete(&self, id: i64) -> Result<bool, StorageError>;
}

/// `<data_local_dir>/jobhound/jobs.sqlite`, or the temp dir when the platform
/// has no data directory.
#[must_use]
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("jobhound")
        .join(DATABASE_FILE)
}
