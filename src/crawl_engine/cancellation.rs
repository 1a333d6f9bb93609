//! Cooperative cancellation
//!
//! A token is cancelled either in-process (signal handler, caller) or by the
//! stop sentinel appearing on disk. The crawl loop polls it at fixed points.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    stop_file: Option<Arc<PathBuf>>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that also reports cancelled while `stop_file` exists.
    #[must_use]
    pub fn watching(stop_file: impl Into<PathBuf>) -> Self {
        Self {
            flag: Arc::default(),
            stop_file: Some(Arc::new(stop_file.into())),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::SeqCst) {
            return true;
        }
        self.stop_file.as_deref().is_some_and(|p| p.exists())
    }
}
