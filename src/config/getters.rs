//! Getter methods for `ScraperConfig`

use std::path::Path;
use std::time::Duration;

use super::types::ScraperConfig;

impl ScraperConfig {
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    #[must_use]
    pub fn status_file(&self) -> &Path {
        &self.status_file
    }

    #[must_use]
    pub fn jobs_file(&self) -> &Path {
        &self.jobs_file
    }

    #[must_use]
    pub fn stop_file(&self) -> &Path {
        &self.stop_file
    }

    #[must_use]
    pub fn run_config_file(&self) -> &Path {
        &self.run_config_file
    }

    #[must_use]
    pub fn excluded_words_file(&self) -> &Path {
        &self.excluded_words_file
    }

    #[must_use]
    pub fn sites_dir(&self) -> &Path {
        &self.sites_dir
    }

    #[must_use]
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    #[must_use]
    pub fn stop_grace(&self) -> Duration {
        self.stop_grace
    }

    #[must_use]
    pub fn terminate_grace(&self) -> Duration {
        self.terminate_grace
    }

    #[must_use]
    pub fn navigation_timeout_secs(&self) -> u64 {
        self.navigation_timeout_secs
    }

    #[must_use]
    pub fn listing_wait_secs(&self) -> u64 {
        self.listing_wait_secs
    }

    #[must_use]
    pub fn deep_listing_wait_secs(&self) -> u64 {
        self.deep_listing_wait_secs
    }

    #[must_use]
    pub fn deep_page_threshold(&self) -> u32 {
        self.deep_page_threshold
    }

    #[must_use]
    pub fn human_pacing(&self) -> bool {
        self.human_pacing
    }
}
