//! Configuration for the scraper worker and its supervisor
//!
//! `ScraperConfig` carries the work-directory layout and timing knobs and is
//! built through a typestate builder. `RunConfig` and `SiteConfig` are the JSON
//! documents read from disk.

pub mod builder;
pub mod getters;
pub mod run_config;
pub mod site;
pub mod types;

use std::path::PathBuf;

pub use builder::{ScraperConfigBuilder, WithWorkDir};
pub use run_config::RunConfig;
pub use site::{Selectors, SiteConfig};
pub use types::ScraperConfig;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown site: {0}")]
    UnknownSite(String),

    #[error("invalid run configuration: {0}")]
    InvalidRunConfig(String),

    #[error("site {site} is missing selector `{field}`")]
    MissingSelector { site: String, field: &'static str },

    #[error("invalid site configuration for {site}: {reason}")]
    InvalidSiteConfig { site: String, reason: String },

    #[error("{0} is required")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_error_names_its_cause_once() {
        let err = ConfigError::Read {
            path: PathBuf::from("/work/scraper_config.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.to_string(), "failed to read /work/scraper_config.json");

        let chain = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(chain, "failed to read /work/scraper_config.json: no such file");
    }
}
