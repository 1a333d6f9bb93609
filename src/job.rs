//! Normalized job posting record
//!
//! Produced by a site adapter, appended to the job stream by the worker and
//! handed to storage by the supervisor. The serialized field names are the
//! wire format of the job stream.

use serde::{Deserialize, Serialize};

use crate::sites::SiteId;

pub const UNKNOWN_LOCATION: &str = "Unknown Location";
pub const UNKNOWN_TYPE: &str = "Unknown Type";

/// A single posting as extracted from a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(rename = "Title")]
    pub title: String,

    #[serde(rename = "Company")]
    pub company: String,

    /// Relative posted-time text exactly as the site shows it.
    #[serde(rename = "Posted", default)]
    pub posted_raw: String,

    /// Absolute posted time (`YYYY-MM-DD HH:MM:SS`, local), empty when the
    /// site shows no time for the listing.
    #[serde(rename = "Time", default)]
    pub posted_at: String,

    #[serde(rename = "Link", default)]
    pub link: String,

    #[serde(rename = "Location", default)]
    pub location: String,

    #[serde(rename = "Type", default)]
    pub job_type: String,

    #[serde(rename = "Description", default)]
    pub description: String,

    #[serde(rename = "Site")]
    pub site: SiteId,
}

impl JobPosting {
    /// Build a posting, trimming every field and applying the per-field
    /// defaults. Returns `None` when title or company is empty after trimming.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        site: SiteId,
        title: &str,
        company: &str,
        posted_raw: &str,
        posted_at: String,
        link: Option<String>,
        location: Option<String>,
        job_type: Option<String>,
        description: &[Option<String>],
    ) -> Option<Self> {
        let title = title.trim();
        let company = company.trim();
        if title.is_empty() || company.is_empty() {
            return None;
        }

        Some(Self {
            title: title.to_string(),
            company: company.to_string(),
            posted_raw: posted_raw.trim().to_string(),
            posted_at,
            link: link.map(|l| l.trim().to_string()).unwrap_or_default(),
            location: non_empty_or(location, UNKNOWN_LOCATION),
            job_type: non_empty_or(job_type, UNKNOWN_TYPE),
            description: join_segments(description),
            site,
        })
    }

    /// True when both identifying fields carry text.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.company.trim().is_empty()
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

/// Join one or two description segments with a newline, skipping blanks.
fn join_segments(segments: &[Option<String>]) -> String {
    segments
        .iter()
        .flatten()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
