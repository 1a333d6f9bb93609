//! Per-run parameters handed from the supervisor to the worker

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::sites::SiteId;
use crate::utils::constants::DAY_SENTINEL_HOURS;

/// Maximum posting age and target site for one worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub hours: u32,
    pub site: SiteId,
}

impl RunConfig {
    pub fn new(hours: u32, site: SiteId) -> Result<Self, ConfigError> {
        let config = Self { hours, site };
        config.validate()?;
        Ok(config)
    }

    /// `hours` must be positive and below the day sentinel, so that a
    /// day-granularity posting always exceeds the window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hours == 0 || self.hours >= DAY_SENTINEL_HOURS {
            return Err(ConfigError::InvalidRunConfig(format!(
                "hours must be between 1 and {}, got {}",
                DAY_SENTINEL_HOURS - 1,
                self.hours
            )));
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn bounds() {
        assert!(RunConfig::new(1, SiteId::AllJobs).is_ok());
        assert!(RunConfig::new(998, SiteId::AllJobs).is_ok());
        assert!(RunConfig::new(0, SiteId::AllJobs).is_err());
        assert!(RunConfig::new(DAY_SENTINEL_HOURS, SiteId::Jobmaster).is_err());
    }

    #[test]
    fn save_then_load() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("scraper_config.json");

        RunConfig::new(6, SiteId::Jobmaster)?.save(&path)?;
        let raw = std::fs::read_to_string(&path)?;
        assert!(raw.contains("\"site\": \"jobmaster\""));

        assert_eq!(RunConfig::load(&path)?, RunConfig { hours: 6, site: SiteId::Jobmaster });
        Ok(())
    }

    #[test]
    fn load_rejects_unknown_site_and_bad_hours() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("scraper_config.json");

        std::fs::write(&path, r#"{"hours": 5, "site": "indeed"}"#)?;
        assert!(matches!(RunConfig::load(&path), Err(ConfigError::Parse { .. })));

        std::fs::write(&path, r#"{"hours": 1000, "site": "alljobs"}"#)?;
        assert!(matches!(RunConfig::load(&path), Err(ConfigError::InvalidRunConfig(_))));
        Ok(())
    }
}
