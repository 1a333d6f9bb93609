//! Core types and traits for the crawl loop.

use std::time::Duration;

use async_trait::async_trait;

use super::pacing::Pacing;
use crate::config::ScraperConfig;
use crate::ipc::{IpcError, RunState};
use crate::job::JobPosting;

/// Fatal-to-run crawl failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CrawlError {
    #[error("Error loading page {page}: {message}")]
    Navigation { page: u32, message: String },

    #[error("Timed out waiting for job listings on page {page}")]
    ListingTimeout { page: u32 },

    #[error("Error with pagination on page {page}: {message}")]
    Pagination { page: u32, message: String },

    #[error("Browser error: {0}")]
    Browser(String),
}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // Use {:#} to preserve full error chain with context
        Self::Browser(format!("{err:#}"))
    }
}

/// Terminal result of one crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOutcome {
    pub state: RunState,
    pub message: String,
    pub jobs_scraped: u32,
    pub current_page: u32,
}

impl CrawlOutcome {
    pub fn completed(message: impl Into<String>, jobs_scraped: u32, current_page: u32) -> Self {
        Self {
            state: RunState::Completed,
            message: message.into(),
            jobs_scraped,
            current_page,
        }
    }

    #[must_use]
    pub fn stopped(jobs_scraped: u32, current_page: u32) -> Self {
        Self {
            state: RunState::Stopped,
            message: format!("Scraping stopped by user. Jobs scraped: {jobs_scraped}"),
            jobs_scraped,
            current_page,
        }
    }

    #[must_use]
    pub fn failed(error: &CrawlError, jobs_scraped: u32, current_page: u32) -> Self {
        Self {
            state: RunState::Error,
            message: error.to_string(),
            jobs_scraped,
            current_page,
        }
    }
}

/// Knobs for one crawl run.
#[derive(Debug, Clone, Copy)]
pub struct CrawlSettings {
    /// Postings older than this end the run.
    pub max_age_hours: u32,
    pub pacing: Pacing,
    pub navigation_timeout_secs: u64,
    pub listing_wait_secs: u64,
    pub deep_listing_wait_secs: u64,
    pub deep_page_threshold: u32,
}

impl CrawlSettings {
    #[must_use]
    pub fn from_config(config: &ScraperConfig, max_age_hours: u32) -> Self {
        Self {
            max_age_hours,
            pacing: if config.human_pacing() {
                Pacing::human()
            } else {
                Pacing::none()
            },
            navigation_timeout_secs: config.navigation_timeout_secs(),
            listing_wait_secs: config.listing_wait_secs(),
            deep_listing_wait_secs: config.deep_listing_wait_secs(),
            deep_page_threshold: config.deep_page_threshold(),
        }
    }

    /// Listing container timeout for `page`.
    #[must_use]
    pub fn listing_wait(&self, page: u32) -> u64 {
        if page >= self.deep_page_threshold {
            self.deep_listing_wait_secs
        } else {
            self.listing_wait_secs
        }
    }
}

/// Destination for accepted postings.
pub trait JobSink: Send + Sync {
    fn append(&self, job: &JobPosting) -> Result<(), IpcError>;
}

/// The page-level browser operations the crawl loop needs.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn goto(&self, url: &str) -> anyhow::Result<()>;

    /// Resolve once `selector` matches. Callers bound it with a timeout.
    async fn wait_for(&self, selector: &str, poll: Duration) -> anyhow::Result<()>;

    async fn scroll_by(&self, dy: i64) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_pages_wait_longer() {
        let config = ScraperConfig::builder()
            .work_dir("/tmp/jobhound-settings")
            .build()
            .expect("valid config");
        let settings = CrawlSettings::from_config(&config, 6);

        assert_eq!(settings.listing_wait(1), 10);
        assert_eq!(settings.listing_wait(9), 10);
        assert_eq!(settings.listing_wait(10), 15);
        assert_eq!(settings.listing_wait(42), 15);
    }
}
