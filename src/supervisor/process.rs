//! Worker process spawning and signalling

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::SupervisorError;
use crate::config::ScraperConfig;

/// How to start a worker: program plus arguments. The working directory is
/// always the run's work dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl WorkerCommand {
    pub fn new<I, A>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// This executable's `worker` subcommand, pointed at the same files as
    /// `config`.
    pub fn current_exe(config: &ScraperConfig) -> std::io::Result<Self> {
        let mut args = vec![
            "worker".to_string(),
            "--work-dir".to_string(),
            config.work_dir().display().to_string(),
            "--sites-dir".to_string(),
            config.sites_dir().display().to_string(),
            "--excluded-words".to_string(),
            config.excluded_words_file().display().to_string(),
        ];
        if !config.headless() {
            args.push("--headed".to_string());
        }
        Ok(Self::new(std::env::current_exe()?, args))
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Spawn in `work_dir`. On Unix the worker leads its own process group so
    /// the browser it starts can be killed with it.
    pub fn spawn(&self, work_dir: &Path) -> Result<Child, SupervisorError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        #[cfg(unix)]
        command.process_group(0);

        debug!("Spawning worker: {} {:?}", self.program.display(), self.args);
        command.spawn().map_err(|source| SupervisorError::Spawn {
            program: self.program.clone(),
            source,
        })
    }
}

/// Ask the worker to exit. It handles SIGTERM like a cooperative stop.
pub(crate) fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                warn!("Failed to send SIGTERM to worker {pid}: {e}");
            }
            return;
        }
    }

    if let Err(e) = child.start_kill() {
        warn!("Failed to terminate worker: {e}");
    }
}

/// Kill the worker and, on Unix, everything left in its process group.
pub(crate) fn kill(child: &mut Child) {
    kill_group(child.id());

    if let Err(e) = child.start_kill() {
        debug!("start_kill after group kill: {e}");
    }
}

/// SIGKILL whatever is left in the group led by `leader`. The worker spawns
/// its browser into that group, so this also works after the worker itself
/// has exited.
pub(crate) fn kill_group(leader: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = leader {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) => debug!("Killed process group {pid}"),
            Err(Errno::ESRCH) => {}
            Err(e) => debug!("killpg({pid}) failed: {e}"),
        }
    }
    #[cfg(not(unix))]
    let _ = leader;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_exe_forwards_paths_and_head_mode() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let config = ScraperConfig::builder()
            .work_dir(dir.path())
            .headless(false)
            .build()?;

        let command = WorkerCommand::current_exe(&config)?;
        let args = command.args();
        assert_eq!(args[0], "worker");
        assert!(args.windows(2).any(|w| w[0] == "--work-dir"));
        assert_eq!(args.last().map(String::as_str), Some("--headed"));
        Ok(())
    }
}
