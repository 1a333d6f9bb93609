//! jobhound: scrape orchestration for job-listing sites
//!
//! A worker process drives a stealth browser through per-site adapters and
//! appends accepted postings to a job stream; a supervisor process spawns it,
//! tails that stream into storage and mirrors the worker's status. The two
//! talk through a handful of files in a shared work directory.

pub mod browser_profile;
pub mod browser_session;
pub mod browser_setup;
pub mod config;
pub mod crawl_engine;
pub mod exclusion;
pub mod ipc;
pub mod job;
pub mod kromekover;
pub mod relative_time;
pub mod sites;
pub mod storage;
pub mod supervisor;
pub mod utils;
pub mod worker;

pub use browser_session::{BrowserPage, BrowserSession};
pub use browser_setup::{find_browser_executable, launch_browser};
pub use config::{ConfigError, RunConfig, ScraperConfig, SiteConfig};
pub use crawl_engine::{CancellationToken, CrawlEngine, CrawlError, CrawlOutcome, CrawlSettings};
pub use exclusion::ExclusionList;
pub use ipc::{IpcError, RunState, RunStatus};
pub use job::JobPosting;
pub use sites::{Extraction, SiteAdapter, SiteId};
pub use storage::{JobStore, SqliteJobStore, StorageError};
pub use supervisor::{Supervisor, SupervisorError, SupervisorOutcome, WorkerCommand};
pub use worker::{run_worker, run_worker_until};
