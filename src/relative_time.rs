//! Relative posted-time parsing
//!
//! Listing sites show the age of a posting as text such as "לפני 3 שעות"
//! ("3 hours ago") or "לפני 2 ימים" ("2 days ago"). Only hour and day
//! granularity are recognized.
//!
//! Unrecognized or unparsable text yields age 0, i.e. "just posted". That
//! keeps the run going instead of stopping it on a malformed label.

use chrono::{DateTime, Duration, Local};

use crate::utils::constants::{DAY_MARKERS, DAY_SENTINEL_HOURS, HOUR_MARKERS};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn has_marker(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.contains(m))
}

/// Hour count carried by an hour-granularity label: the second
/// whitespace-separated token. `None` if the label has no hour marker.
fn hour_value(text: &str) -> Option<u32> {
    if !has_marker(text, HOUR_MARKERS) {
        return None;
    }
    Some(
        text.split_whitespace()
            .nth(1)
            .and_then(|token| token.parse::<u32>().ok())
            .unwrap_or(0),
    )
}

/// Age of a posting in hours.
///
/// Hour markers return their number (0 when it does not parse), day markers
/// return [`DAY_SENTINEL_HOURS`], anything else returns 0.
#[must_use]
pub fn relative_age_hours(text: &str) -> u32 {
    if let Some(hours) = hour_value(text) {
        return hours;
    }
    if has_marker(text, DAY_MARKERS) {
        return DAY_SENTINEL_HOURS;
    }
    0
}

/// Absolute posted time for a relative label, relative to `now`.
///
/// Only hour labels shift the timestamp; day labels never reach the job
/// stream because their sentinel age ends the run first.
#[must_use]
pub fn posted_timestamp(text: &str, now: DateTime<Local>) -> String {
    let hours = hour_value(text).unwrap_or(0);
    (now - Duration::hours(i64::from(hours)))
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// [`posted_timestamp`] against the current local time. Empty input gives an
/// empty timestamp.
#[must_use]
pub fn posted_timestamp_now(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    posted_timestamp(text, Local::now())
}
