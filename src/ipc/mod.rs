//! File-based channel between the worker and its supervisor
//!
//! Four files in the work directory, each with a single writer:
//! - status document, rewritten atomically by the worker
//! - append-only job stream, one JSON document per line, written by the worker
//! - stop sentinel, created by the supervisor, existence only
//! - run configuration, written once by the supervisor before spawn
//!
//! There is no locking. Readers treat missing, empty or half-written files as
//! "no update yet".

pub mod job_stream;
pub mod status;
pub mod stop_signal;

use std::path::PathBuf;

pub use job_stream::{JobStreamReader, JobStreamWriter};
pub use status::{RunState, RunStatus, StatusFile};
pub use stop_signal::StopSignal;

#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode document")]
    Encode(#[from] serde_json::Error),

    #[error("malformed job line")]
    MalformedLine {
        line: String,
        #[source]
        source: serde_json::Error,
    },
}

impl IpcError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Remove a file, treating "already gone" as success.
pub(crate) fn remove_if_exists(path: &std::path::Path) -> Result<(), IpcError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(IpcError::io(path, e)),
    }
}
