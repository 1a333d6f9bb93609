//! Core configuration type shared by the worker and the supervisor

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Work-directory layout and timing for one scraper installation.
///
/// Both processes build the same `ScraperConfig` from the same work directory,
/// which is how they agree on the IPC file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Directory holding the IPC files.
    ///
    /// **INVARIANT:** Always an absolute path (normalized in builder).
    pub(crate) work_dir: PathBuf,
    pub(crate) status_file: PathBuf,
    pub(crate) jobs_file: PathBuf,
    pub(crate) stop_file: PathBuf,
    pub(crate) run_config_file: PathBuf,
    pub(crate) excluded_words_file: PathBuf,
    pub(crate) sites_dir: PathBuf,
    pub(crate) log_dir: PathBuf,

    pub(crate) headless: bool,

    /// Supervisor poll period for liveness, status and new job lines.
    pub(crate) poll_interval: Duration,

    /// How long a stop request waits for a cooperative exit before SIGTERM.
    pub(crate) stop_grace: Duration,

    /// How long to wait after SIGTERM before the worker is killed.
    pub(crate) terminate_grace: Duration,

    /// Timeout for `page.goto()`.
    pub(crate) navigation_timeout_secs: u64,

    /// Listing container wait before `deep_page_threshold`.
    pub(crate) listing_wait_secs: u64,

    /// Listing container wait from `deep_page_threshold` on. Deep result pages
    /// render noticeably slower on both sites.
    pub(crate) deep_listing_wait_secs: u64,

    pub(crate) deep_page_threshold: u32,

    /// Disable to run the crawl loop without human-like delays.
    pub(crate) human_pacing: bool,
}
