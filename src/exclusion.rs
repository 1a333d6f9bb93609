//! Keyword-based exclusion of postings
//!
//! Two independent keyword lists, matched as case-insensitive substrings of
//! the title and the company. Loaded once per worker process.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::utils::constants::ALLOWED_EXACT_TITLE;

/// On-disk shape of the excluded-words file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludedWordsFile {
    #[serde(default, alias = "RAW_KEYWORDS_TO_EXCLUDE_TITLES")]
    pub titles: Vec<String>,
    #[serde(default, alias = "RAW_KEYWORDS_TO_EXCLUDE_COMPANIES")]
    pub companies: Vec<String>,
}

/// Lowercased title and company keywords.
#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    titles: Vec<String>,
    companies: Vec<String>,
}

impl ExclusionList {
    pub fn new<T, C>(titles: T, companies: C) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            titles: normalize(titles),
            companies: normalize(companies),
        }
    }

    /// Load the keyword lists. A missing or malformed file yields empty lists
    /// and a warning; the run proceeds unfiltered.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Excluded words file not found at {}, filtering disabled", path.display());
                return Self::default();
            }
            Err(e) => {
                warn!("Could not read excluded words file {}: {e}", path.display());
                return Self::default();
            }
        };

        match serde_json::from_str::<ExcludedWordsFile>(&raw) {
            Ok(file) => {
                let list = Self::new(file.titles, file.companies);
                info!(
                    "Loaded {} title and {} company exclusion keywords",
                    list.titles.len(),
                    list.companies.len()
                );
                list
            }
            Err(e) => {
                warn!("Error decoding excluded words file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// True when the posting should be dropped.
    #[must_use]
    pub fn is_excluded(&self, title: &str, company: &str) -> bool {
        let title = title.to_lowercase();
        if title == ALLOWED_EXACT_TITLE {
            return false;
        }

        if let Some(keyword) = self.titles.iter().find(|k| title.contains(k.as_str())) {
            debug!("Excluded due to title keyword: {keyword}");
            return true;
        }

        let company = company.to_lowercase();
        if let Some(keyword) = self.companies.iter().find(|k| company.contains(k.as_str())) {
            debug!("Excluded due to company keyword: {keyword}");
            return true;
        }

        false
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty() && self.companies.is_empty()
    }
}

// Empty keywords would match every posting, so they are dropped here.
fn normalize<I>(words: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    words
        .into_iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}
