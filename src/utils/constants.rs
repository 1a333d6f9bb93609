//! Shared constants for the scraper worker and its supervisor
//!
//! File names, timing bounds and locale markers live here so the worker and
//! the controller agree on them without passing them around.

/// Status document, overwritten wholesale by the worker.
pub const STATUS_FILE: &str = "scraper_status.json";

/// Append-only job stream, one JSON document per line.
pub const JOBS_FILE: &str = "scraped_jobs.jsonl";

/// Stop sentinel. Presence is the whole signal.
pub const STOP_FILE: &str = "scraper_stop.flag";

/// Run configuration written by the supervisor before spawn.
pub const RUN_CONFIG_FILE: &str = "scraper_config.json";

/// Editable exclusion keyword lists.
pub const EXCLUDED_WORDS_FILE: &str = "excludedwords.json";

/// Directory (relative to the work dir) holding per-site selector files.
pub const SITES_DIR: &str = "sites";

/// Directory (relative to the work dir) for worker log files.
pub const LOG_DIR: &str = "logs";

/// Age reported for day-granularity markers.
///
/// Must stay above any accepted `RunConfig::hours` so that a day-old posting
/// always ends the run.
pub const DAY_SENTINEL_HOURS: u32 = 999;

/// Hour-granularity markers in the listing sites' locale ("hour", "hours").
pub const HOUR_MARKERS: &[&str] = &["שעה", "שעות"];

/// Day-granularity markers in the listing sites' locale ("day", "days").
pub const DAY_MARKERS: &[&str] = &["יום", "ימים"];

/// Title that is never excluded, compared after lowercasing ("English").
pub const ALLOWED_EXACT_TITLE: &str = "אנגלית";

/// Timeout for the listing container on shallow pages.
pub const LISTING_WAIT_SECS: u64 = 10;

/// Timeout for the listing container from `DEEP_PAGE_THRESHOLD` on.
pub const DEEP_LISTING_WAIT_SECS: u64 = 15;

/// First page number that gets the longer listing wait.
pub const DEEP_PAGE_THRESHOLD: u32 = 10;

/// Timeout for a single page navigation.
pub const NAVIGATION_TIMEOUT_SECS: u64 = 30;

/// Supervisor poll interval.
pub const POLL_INTERVAL_SECS: u64 = 2;

/// How long a stop request waits for the worker before SIGTERM.
pub const STOP_GRACE_SECS: u64 = 15;

/// How long to wait after SIGTERM before killing the worker.
pub const TERMINATE_GRACE_SECS: u64 = 5;

/// Prefix for per-run browser profile directories in the temp dir.
pub const PROFILE_PREFIX: &str = "jobhound_chrome";

/// Chrome user agent string for stealth mode
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
