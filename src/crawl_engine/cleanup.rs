//! Browser teardown
//!
//! Graceful close first, then force-kill whatever automation browser
//! processes survived, then the profile directory.

use std::path::Path;

use chromiumoxide::Browser;
use log::{debug, info, warn};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tokio::task::JoinHandle;

/// Result of cleanup operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupResult {
    /// All cleanup operations succeeded
    Success,
    /// Some cleanup operations failed, with error details
    PartialFailure(Vec<String>),
}

impl CleanupResult {
    fn from_errors(errors: Vec<String>) -> Self {
        if errors.is_empty() {
            Self::Success
        } else {
            Self::PartialFailure(errors)
        }
    }
}

/// Close the browser, wait for its process and stop the CDP handler task.
pub async fn close_browser(browser: &mut Browser, handler: JoinHandle<()>) -> CleanupResult {
    let mut errors = Vec::new();

    debug!(target: "jobhound::cleanup", "Closing browser");
    if let Err(e) = browser.close().await {
        warn!(target: "jobhound::cleanup", "Failed to close browser: {e}");
        errors.push(format!("Browser close failed: {e}"));
    }

    // Wait for browser process to fully exit
    if let Err(e) = browser.wait().await {
        warn!(target: "jobhound::cleanup", "Failed to wait for browser exit: {e}");
        errors.push(format!("Browser wait failed: {e}"));
    }

    handler.abort();
    CleanupResult::from_errors(errors)
}

/// True for a browser process left behind by an automated session.
#[must_use]
pub fn is_orphaned_browser(name: &str, cmdline: &[String], profile_dir: Option<&Path>) -> bool {
    let name = name.to_lowercase();
    if !(name.contains("chrome") || name.contains("chromium")) {
        return false;
    }

    let profile = profile_dir.map(|p| p.to_string_lossy().into_owned());
    cmdline.iter().any(|arg| {
        let arg_lower = arg.to_lowercase();
        arg_lower.contains("--enable-automation")
            || arg_lower.contains("--test-type")
            || profile.as_deref().is_some_and(|p| arg.contains(p))
    })
}

/// Kill every orphaned automation browser. Returns how many were signalled.
pub fn kill_orphaned_browsers(profile_dir: Option<&Path>) -> usize {
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always),
    );

    let own_pid = std::process::id();
    let mut killed = 0;
    for (pid, process) in system.processes() {
        if pid.as_u32() == own_pid {
            continue;
        }
        let name = process.name().to_string_lossy();
        let cmdline: Vec<String> = process
            .cmd()
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();

        if is_orphaned_browser(&name, &cmdline, profile_dir) {
            info!(target: "jobhound::cleanup", "Killing lingering browser process: {pid}");
            if process.kill() {
                killed += 1;
            }
        }
    }
    killed
}

/// Remove the profile directory, tolerating one that is already gone.
pub fn remove_profile_dir(path: &Path) -> CleanupResult {
    match std::fs::remove_dir_all(path) {
        Ok(()) => CleanupResult::Success,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CleanupResult::Success,
        Err(e) => {
            warn!(target: "jobhound::cleanup", "Failed to remove profile {}: {e}", path.display());
            CleanupResult::PartialFailure(vec![format!("Directory cleanup failed: {e}")])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn automation_flags_mark_orphans() {
        assert!(is_orphaned_browser(
            "chrome",
            &args(&["/opt/google/chrome/chrome", "--enable-automation"]),
            None
        ));
        assert!(is_orphaned_browser("Chromium", &args(&["--test-type=webdriver"]), None));
        assert!(is_orphaned_browser("chromedriver", &args(&["--Enable-Automation"]), None));
    }

    #[test]
    fn profile_dir_marks_orphans() {
        let profile = PathBuf::from("/tmp/jobhound_chrome_1234");
        assert!(is_orphaned_browser(
            "chrome",
            &args(&["--user-data-dir=/tmp/jobhound_chrome_1234"]),
            Some(&profile)
        ));
    }

    #[test]
    fn ordinary_processes_are_left_alone() {
        assert!(!is_orphaned_browser("chrome", &args(&["--type=renderer"]), None));
        assert!(!is_orphaned_browser("firefox", &args(&["--enable-automation"]), None));
    }

    #[test]
    fn removing_missing_profile_is_success() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        assert_eq!(remove_profile_dir(&dir.path().join("gone")), CleanupResult::Success);
    }
}
