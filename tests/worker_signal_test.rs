//! A termination signal while the browser is still launching.
//!
//! Kept in its own test binary: it points `CHROMIUM_PATH` at a stand-in
//! browser for the whole process.
#![cfg(target_os = "linux")]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use jobhound::config::{RunConfig, ScraperConfig};
use jobhound::ipc::{RunState, StatusFile};
use jobhound::run_worker_until;
use jobhound::sites::SiteId;
use tempfile::TempDir;

/// Records its pid and profile dir, then never reports a DevTools endpoint.
fn write_fake_browser(dir: &Path) -> anyhow::Result<PathBuf> {
    let path = dir.join("fake-chrome");
    let script = format!(
        "#!/bin/sh\n\
         for arg in \"$@\"; do\n\
           case \"$arg\" in --user-data-dir=*) echo \"${{arg#--user-data-dir=}}\" > {dir}/browser.profile ;; esac\n\
         done\n\
         echo $$ > {dir}/browser.pid.tmp && mv {dir}/browser.pid.tmp {dir}/browser.pid\n\
         exec sleep 30\n",
        dir = dir.display()
    );
    std::fs::write(&path, script)?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

fn is_alive(pid: u32) -> bool {
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .and_then(|stat| {
            let (_, rest) = stat.rsplit_once(')')?;
            rest.trim_start().chars().next()
        })
        .is_some_and(|state| state != 'Z' && state != 'X')
}

#[tokio::test]
async fn signal_during_browser_launch_still_cleans_up() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let browser = write_fake_browser(dir.path())?;
    // SAFETY: the only test in this binary, set before any thread reads it
    unsafe { std::env::set_var("CHROMIUM_PATH", &browser) };

    let config = ScraperConfig::builder().work_dir(dir.path()).build()?;
    RunConfig::new(6, SiteId::AllJobs)?.save(config.run_config_file())?;
    std::fs::create_dir_all(config.sites_dir())?;
    std::fs::write(
        config.sites_dir().join("alljobs.json"),
        r#"{"base_url": "https://jobs.test/list?page={page}", "selectors": {}}"#,
    )?;

    let pid_file = dir.path().join("browser.pid");
    let launched = pid_file.clone();
    let shutdown = async move {
        while !launched.exists() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        "SIGTERM"
    };

    let state = run_worker_until(&config, shutdown).await;

    assert_eq!(state, RunState::Stopped);
    let status = StatusFile::new(config.status_file())
        .read()
        .ok_or_else(|| anyhow::anyhow!("worker left no status"))?;
    assert_eq!(status.status, RunState::Stopped);
    assert_eq!(status.message, "Process terminated by signal");

    let browser_pid: u32 = std::fs::read_to_string(&pid_file)?.trim().parse()?;
    let deadline = Instant::now() + Duration::from_secs(2);
    while is_alive(browser_pid) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(!is_alive(browser_pid), "browser {browser_pid} outlived the worker run");

    let profile = std::fs::read_to_string(dir.path().join("browser.profile"))?;
    assert!(!Path::new(profile.trim()).exists(), "profile {} left on disk", profile.trim());
    Ok(())
}
