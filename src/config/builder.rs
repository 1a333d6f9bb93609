//! Type-safe builder for `ScraperConfig` using the typestate pattern
//!
//! `build()` only exists once the work directory is set. Every IPC path
//! defaults to its well-known file name inside the work directory.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::ConfigError;
use super::types::ScraperConfig;
use crate::utils::constants::{
    DEEP_LISTING_WAIT_SECS, DEEP_PAGE_THRESHOLD, EXCLUDED_WORDS_FILE, JOBS_FILE, LISTING_WAIT_SECS,
    LOG_DIR, NAVIGATION_TIMEOUT_SECS, POLL_INTERVAL_SECS, RUN_CONFIG_FILE, SITES_DIR, STATUS_FILE,
    STOP_FILE, STOP_GRACE_SECS, TERMINATE_GRACE_SECS,
};

// Type states for the builder
pub struct WithWorkDir;

pub struct ScraperConfigBuilder<State = ()> {
    pub(crate) work_dir: Option<PathBuf>,
    pub(crate) excluded_words_file: Option<PathBuf>,
    pub(crate) sites_dir: Option<PathBuf>,
    pub(crate) headless: bool,
    pub(crate) poll_interval: Duration,
    pub(crate) stop_grace: Duration,
    pub(crate) terminate_grace: Duration,
    pub(crate) navigation_timeout_secs: u64,
    pub(crate) listing_wait_secs: u64,
    pub(crate) deep_listing_wait_secs: u64,
    pub(crate) deep_page_threshold: u32,
    pub(crate) human_pacing: bool,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ScraperConfigBuilder<()> {
    fn default() -> Self {
        Self {
            work_dir: None,
            excluded_words_file: None,
            sites_dir: None,
            headless: true,
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            stop_grace: Duration::from_secs(STOP_GRACE_SECS),
            terminate_grace: Duration::from_secs(TERMINATE_GRACE_SECS),
            navigation_timeout_secs: NAVIGATION_TIMEOUT_SECS,
            listing_wait_secs: LISTING_WAIT_SECS,
            deep_listing_wait_secs: DEEP_LISTING_WAIT_SECS,
            deep_page_threshold: DEEP_PAGE_THRESHOLD,
            human_pacing: true,
            _phantom: PhantomData,
        }
    }
}

impl ScraperConfig {
    /// Create a builder for configuring a `ScraperConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ScraperConfigBuilder<()> {
        ScraperConfigBuilder::default()
    }
}

impl ScraperConfigBuilder<()> {
    pub fn work_dir(self, dir: impl Into<PathBuf>) -> ScraperConfigBuilder<WithWorkDir> {
        ScraperConfigBuilder {
            work_dir: Some(dir.into()),
            excluded_words_file: self.excluded_words_file,
            sites_dir: self.sites_dir,
            headless: self.headless,
            poll_interval: self.poll_interval,
            stop_grace: self.stop_grace,
            terminate_grace: self.terminate_grace,
            navigation_timeout_secs: self.navigation_timeout_secs,
            listing_wait_secs: self.listing_wait_secs,
            deep_listing_wait_secs: self.deep_listing_wait_secs,
            deep_page_threshold: self.deep_page_threshold,
            human_pacing: self.human_pacing,
            _phantom: PhantomData,
        }
    }
}

impl<State> ScraperConfigBuilder<State> {
    /// Override the excluded-words file location.
    #[must_use]
    pub fn excluded_words_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded_words_file = Some(path.into());
        self
    }

    /// Override the directory holding `<site>.json` selector files.
    #[must_use]
    pub fn sites_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sites_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    #[must_use]
    pub fn terminate_grace(mut self, grace: Duration) -> Self {
        self.terminate_grace = grace;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn listing_wait_secs(mut self, shallow: u64, deep: u64) -> Self {
        self.listing_wait_secs = shallow;
        self.deep_listing_wait_secs = deep;
        self
    }

    #[must_use]
    pub fn human_pacing(mut self, enabled: bool) -> Self {
        self.human_pacing = enabled;
        self
    }
}

// Build method only available when all required fields are set
impl ScraperConfigBuilder<WithWorkDir> {
    pub fn build(self) -> Result<ScraperConfig, ConfigError> {
        let work_dir = self
            .work_dir
            .ok_or(ConfigError::MissingField("work_dir"))?;
        let work_dir = absolutize(&work_dir)?;

        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidRunConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        Ok(ScraperConfig {
            status_file: work_dir.join(STATUS_FILE),
            jobs_file: work_dir.join(JOBS_FILE),
            stop_file: work_dir.join(STOP_FILE),
            run_config_file: work_dir.join(RUN_CONFIG_FILE),
            excluded_words_file: self
                .excluded_words_file
                .unwrap_or_else(|| work_dir.join(EXCLUDED_WORDS_FILE)),
            sites_dir: self.sites_dir.unwrap_or_else(|| work_dir.join(SITES_DIR)),
            log_dir: work_dir.join(LOG_DIR),
            work_dir,
            headless: self.headless,
            poll_interval: self.poll_interval,
            stop_grace: self.stop_grace,
            terminate_grace: self.terminate_grace,
            navigation_timeout_secs: self.navigation_timeout_secs,
            listing_wait_secs: self.listing_wait_secs,
            deep_listing_wait_secs: self.deep_listing_wait_secs,
            deep_page_threshold: self.deep_page_threshold,
            human_pacing: self.human_pacing,
        })
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_default_into_work_dir() {
        let config = ScraperConfig::builder()
            .work_dir("/srv/jobhound")
            .build()
            .expect("valid config");

        assert_eq!(config.status_file(), Path::new("/srv/jobhound/scraper_status.json"));
        assert_eq!(config.jobs_file(), Path::new("/srv/jobhound/scraped_jobs.jsonl"));
        assert_eq!(config.stop_file(), Path::new("/srv/jobhound/scraper_stop.flag"));
        assert_eq!(config.run_config_file(), Path::new("/srv/jobhound/scraper_config.json"));
        assert_eq!(config.excluded_words_file(), Path::new("/srv/jobhound/excludedwords.json"));
        assert_eq!(config.sites_dir(), Path::new("/srv/jobhound/sites"));
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn overrides_survive_typestate_transition() {
        let config = ScraperConfig::builder()
            .sites_dir("/etc/jobhound/sites")
            .headless(false)
            .work_dir("/srv/jobhound")
            .excluded_words_file("/etc/jobhound/words.json")
            .build()
            .expect("valid config");

        assert_eq!(config.sites_dir(), Path::new("/etc/jobhound/sites"));
        assert_eq!(config.excluded_words_file(), Path::new("/etc/jobhound/words.json"));
        assert!(!config.headless());
    }

    #[test]
    fn relative_work_dir_is_made_absolute() {
        let config = ScraperConfig::builder()
            .work_dir("relative/dir")
            .build()
            .expect("valid config");
        assert!(config.work_dir().is_absolute());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let result = ScraperConfig::builder()
            .work_dir("/srv/jobhound")
            .poll_interval(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }
}
