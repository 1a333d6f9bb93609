//! Crawl Engine Module
//!
//! The site-agnostic page/listing loop and the pieces it is built from:
//! cancellation, pacing, timeouts, status reporting and browser teardown.

pub mod cancellation;
pub mod cleanup;
pub mod core;
pub mod crawl_types;
pub mod pacing;
pub mod page_timeout;
pub mod progress;

pub use cancellation::CancellationToken;
pub use cleanup::CleanupResult;
pub use core::CrawlEngine;
pub use crawl_types::{CrawlError, CrawlOutcome, CrawlSettings, JobSink, PageDriver};
pub use pacing::{Delay, Pacing};
pub use page_timeout::with_page_timeout;
pub use progress::{NoOpStatus, StatusReporter};
