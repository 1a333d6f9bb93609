//! Per-site URL template and CSS selectors
//!
//! Selectors are configuration data kept in `<sites_dir>/<site>.json`:
//!
//! ```json
//! {
//!   "base_url": "https://www.example.co.il/SearchResults.aspx?page={page}",
//!   "selectors": {
//!     "content": ".job-content-top",
//!     "listings": ".open-board",
//!     "title": ".job-content-top-title a.N",
//!     "company": ".T14",
//!     "time_posted": ".job-content-top-date"
//!   }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::sites::SiteId;

/// Placeholder in `base_url` replaced by the 1-based page number.
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// CSS selectors for one site. Which ones are required depends on the adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Element whose presence means listings have rendered.
    pub content: Option<String>,
    pub listings: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub body_upper: Option<String>,
    pub body_lower: Option<String>,
    pub time_posted: Option<String>,
    pub link: Option<String>,
    pub pager: Option<String>,
    pub next_button: Option<String>,
    pub popup: Option<String>,
    pub popup_close: Option<String>,
    /// Side panel opened by clicking a listing.
    pub detail_panel: Option<String>,
    /// Description inside `detail_panel`.
    pub detail_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub base_url: String,
    #[serde(default)]
    pub selectors: Selectors,
}

impl SiteConfig {
    /// Load `<sites_dir>/<site>.json`.
    pub fn load(sites_dir: &Path, site: SiteId) -> Result<Self, ConfigError> {
        let path = sites_dir.join(format!("{site}.json"));
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.validate(site)?;
        Ok(config)
    }

    pub fn validate(&self, site: SiteId) -> Result<(), ConfigError> {
        if !self.base_url.contains(PAGE_PLACEHOLDER) {
            return Err(ConfigError::InvalidSiteConfig {
                site: site.to_string(),
                reason: format!("base_url must contain {PAGE_PLACEHOLDER}"),
            });
        }
        match url::Url::parse(&self.page_url(1)) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            Ok(url) => Err(ConfigError::InvalidSiteConfig {
                site: site.to_string(),
                reason: format!("unsupported base_url scheme {}", url.scheme()),
            }),
            Err(e) => Err(ConfigError::InvalidSiteConfig {
                site: site.to_string(),
                reason: format!("base_url is not a valid URL: {e}"),
            }),
        }
    }

    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        self.base_url.replace(PAGE_PLACEHOLDER, &page.to_string())
    }

    /// A selector the adapter cannot work without.
    pub fn require(
        &self,
        site: SiteId,
        field: &'static str,
        pick: impl Fn(&Selectors) -> &Option<String>,
    ) -> Result<String, ConfigError> {
        match pick(&self.selectors) {
            Some(s) if !s.trim().is_empty() => Ok(s.clone()),
            _ => Err(ConfigError::MissingSelector {
                site: site.to_string(),
                field,
            }),
        }
    }

    /// A selector whose absence only degrades the field it feeds.
    #[must_use]
    pub fn optional(&self, pick: impl Fn(&Selectors) -> &Option<String>) -> Option<String> {
        pick(&self.selectors)
            .as_ref()
            .filter(|s| !s.trim().is_empty())
            .cloned()
    }
}
