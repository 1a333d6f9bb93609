//! Per-run Chrome profile directories
//!
//! Every session gets a fresh UUID-named directory in the temp dir. Directories
//! left behind by crashed runs are found by prefix and removed once their
//! SingletonLock no longer points at a live process.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::utils::constants::PROFILE_PREFIX;

/// RAII wrapper for a profile directory
///
/// Removes the directory on drop unless `into_path()` handed it to another
/// cleanup mechanism.
#[derive(Debug)]
pub struct BrowserProfile {
    path: PathBuf,
    cleanup_on_drop: bool,
}

impl BrowserProfile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            cleanup_on_drop: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume the profile and return the path, disabling auto-cleanup
    pub fn into_path(mut self) -> PathBuf {
        self.cleanup_on_drop = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for BrowserProfile {
    fn drop(&mut self) {
        if self.cleanup_on_drop && self.path.exists() {
            debug!("BrowserProfile cleanup: removing {}", self.path.display());
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                warn!("Failed to cleanup profile directory {}: {e}", self.path.display());
            }
        }
    }
}

/// Create a unique profile directory under `parent`.
pub fn create_unique_profile_in(parent: &Path) -> Result<BrowserProfile> {
    let path = parent.join(format!("{PROFILE_PREFIX}_{}", Uuid::new_v4()));

    // create_dir (not create_dir_all) fails on an existing directory
    std::fs::create_dir(&path)
        .with_context(|| format!("Failed to create profile directory: {}", path.display()))?;

    info!("Created Chrome profile directory: {}", path.display());
    Ok(BrowserProfile::new(path))
}

/// Create a unique profile directory in the system temp dir.
pub fn create_unique_profile() -> Result<BrowserProfile> {
    create_unique_profile_in(&std::env::temp_dir())
}

/// Whether the profile's SingletonLock is absent or held by a dead process.
///
/// The lock is a symlink to `{hostname}-{PID}`.
#[cfg(unix)]
pub fn is_singleton_lock_stale(profile_dir: &Path) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let lock_path = profile_dir.join("SingletonLock");
    if !lock_path.exists() && !lock_path.is_symlink() {
        return true;
    }

    match std::fs::read_link(&lock_path) {
        Ok(target) => {
            let target_str = target.to_string_lossy();
            let Some(pid) = target_str
                .rsplit('-')
                .next()
                .and_then(|s| s.parse::<i32>().ok())
            else {
                warn!("Could not parse PID from SingletonLock target: {target_str}");
                return false;
            };

            // Signal 0 checks for existence without delivering anything
            let alive = kill(Pid::from_raw(pid), None).is_ok();
            if alive {
                debug!("SingletonLock is active: PID {pid} is running");
            } else {
                info!("SingletonLock is stale: PID {pid} no longer exists");
            }
            !alive
        }
        // A regular file where the symlink should be is corrupt
        Err(_) => lock_path.is_file(),
    }
}

#[cfg(not(unix))]
pub fn is_singleton_lock_stale(_profile_dir: &Path) -> bool {
    true
}

/// Remove stale profile directories under `parent`. Returns how many went.
pub fn cleanup_stale_profiles_in(parent: &Path) -> Result<usize> {
    let entries = std::fs::read_dir(parent)
        .with_context(|| format!("Failed to read directory: {}", parent.display()))?;

    let mut cleaned = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_ours = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(PROFILE_PREFIX));

        if is_ours && path.is_dir() && is_singleton_lock_stale(&path) {
            match std::fs::remove_dir_all(&path) {
                Ok(()) => cleaned += 1,
                Err(e) => warn!("Failed to remove stale profile {}: {e}", path.display()),
            }
        }
    }

    if cleaned > 0 {
        info!("Cleaned {cleaned} stale Chrome profile directories");
    }
    Ok(cleaned)
}

/// [`cleanup_stale_profiles_in`] for the system temp dir.
pub fn cleanup_stale_profiles() -> Result<usize> {
    cleanup_stale_profiles_in(&std::env::temp_dir())
}
