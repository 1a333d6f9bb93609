//! Append-only job stream
//!
//! One `JobPosting` JSON document per line. The writer appends whole lines;
//! the reader keeps its own byte cursor and only consumes lines that end in a
//! newline, so a line caught mid-write is picked up on the next pass.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{IpcError, remove_if_exists};
use crate::crawl_engine::JobSink;
use crate::job::JobPosting;

#[derive(Debug, Clone)]
pub struct JobStreamWriter {
    path: PathBuf,
}

impl JobStreamWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, job: &JobPosting) -> Result<(), IpcError> {
        let mut line = serde_json::to_vec(job)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| IpcError::io(&self.path, e))?;
        // Single write so the line lands contiguously.
        file.write_all(&line)
            .map_err(|e| IpcError::io(&self.path, e))
    }

    pub fn clear(&self) -> Result<(), IpcError> {
        remove_if_exists(&self.path)
    }
}

impl JobSink for JobStreamWriter {
    fn append(&self, job: &JobPosting) -> Result<(), IpcError> {
        JobStreamWriter::append(self, job)
    }
}

/// Tails the job stream from a cursor.
#[derive(Debug)]
pub struct JobStreamReader {
    path: PathBuf,
    offset: u64,
    lines_read: u64,
}

impl JobStreamReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            lines_read: 0,
        }
    }

    /// Byte position just past the last consumed newline.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Complete lines consumed so far, blank lines included.
    #[must_use]
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// New complete, non-blank lines since the last call.
    ///
    /// A missing file yields nothing. A file shorter than the cursor means a
    /// new run truncated it, so reading restarts from the top.
    pub fn read_new_lines(&mut self) -> Result<Vec<String>, IpcError> {
        let mut file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(IpcError::io(&self.path, e)),
        };

        let len = file
            .metadata()
            .map_err(|e| IpcError::io(&self.path, e))?
            .len();
        if len < self.offset {
            warn!(
                "Job stream {} shrank below cursor, rereading from start",
                self.path.display()
            );
            self.offset = 0;
            self.lines_read = 0;
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.offset))
            .map_err(|e| IpcError::io(&self.path, e))?;
        let mut buf = Vec::with_capacity((len - self.offset) as usize);
        file.read_to_end(&mut buf)
            .map_err(|e| IpcError::io(&self.path, e))?;

        let Some(last_newline) = buf.iter().rposition(|&b| b == b'\n') else {
            debug!("Job stream has a partial line pending");
            return Ok(Vec::new());
        };
        let complete = &buf[..=last_newline];
        self.offset += complete.len() as u64;

        let mut lines = Vec::new();
        for raw in buf[..last_newline].split(|&b| b == b'\n') {
            self.lines_read += 1;
            let line = String::from_utf8_lossy(raw);
            let line = line.trim();
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
        Ok(lines)
    }

    /// Parse one stream line.
    pub fn parse_line(line: &str) -> Result<JobPosting, IpcError> {
        serde_json::from_str(line).map_err(|source| IpcError::MalformedLine {
            line: line.to_string(),
            source,
        })
    }
}
