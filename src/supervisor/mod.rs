//! Controller side of a scrape run
//!
//! The supervisor resets the IPC files, writes the run configuration, spawns
//! the worker and then polls on a fixed interval. Each tick forwards new
//! complete job-stream lines to storage, mirrors status changes to
//! subscribers and checks whether the worker is still alive. A terminal
//! status or a dead worker ends polling; a final tail pass then picks up any
//! lines written after the last tick.
//!
//! Worker failures never become supervisor errors. They are reported through
//! [`SupervisorOutcome`], and cleanup always runs.

pub mod process;

use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, RunConfig, ScraperConfig};
use crate::crawl_engine::CancellationToken;
use crate::ipc::{IpcError, JobStreamReader, JobStreamWriter, RunState, RunStatus, StatusFile, StopSignal};
use crate::storage::{InsertOutcome, JobStore};

pub use process::WorkerCommand;

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("a scrape run is already in progress")]
    AlreadyRunning,

    #[error("failed to spawn worker {program}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Ipc(#[from] IpcError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Line counts for one run's job stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardCounts {
    pub inserted: u64,
    pub duplicates: u64,
    /// Unparsable lines and storage failures.
    pub failed: u64,
}

impl ForwardCounts {
    /// Lines that reached storage, duplicates included.
    #[must_use]
    pub fn forwarded(&self) -> u64 {
        self.inserted + self.duplicates
    }
}

/// How one supervised run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorOutcome {
    /// Last status the worker wrote, if any.
    pub status: Option<RunStatus>,
    pub exit_code: Option<i32>,
    pub counts: ForwardCounts,
    pub stop_requested: bool,
}

impl SupervisorOutcome {
    /// The worker's terminal state; a worker that died without reporting one
    /// counts as stopped when a stop was requested and as an error otherwise.
    #[must_use]
    pub fn final_state(&self) -> RunState {
        match &self.status {
            Some(status) if status.status.is_terminal() => status.status,
            _ if self.stop_requested => RunState::Stopped,
            _ => RunState::Error,
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match &self.status {
            Some(status) if status.status.is_terminal() => status.message.clone(),
            _ => match self.exit_code {
                Some(code) => format!("Worker exited with code {code} without a final status"),
                None => "Worker exited without a final status".to_string(),
            },
        }
    }
}

/// Spawns and polls one worker at a time.
pub struct Supervisor<S: JobStore> {
    config: ScraperConfig,
    store: S,
    status_tx: watch::Sender<Option<RunStatus>>,
    running: AtomicBool,
}

impl<S: JobStore> Supervisor<S> {
    pub fn new(config: ScraperConfig, store: S) -> Self {
        let (status_tx, _) = watch::channel(None);
        Self {
            config,
            store,
            status_tx,
            running: AtomicBool::new(false),
        }
    }

    /// Receives every status change the worker writes.
    pub fn subscribe(&self) -> watch::Receiver<Option<RunStatus>> {
        self.status_tx.subscribe()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one worker to completion. Cancelling `stop` requests a cooperative
    /// stop, escalating to SIGTERM and then a kill when the worker lingers.
    pub async fn run(
        &self,
        run: &RunConfig,
        worker: &WorkerCommand,
        stop: CancellationToken,
    ) -> Result<SupervisorOutcome, SupervisorError> {
        let _guard = RunGuard::acquire(&self.running)?;
        run.validate()?;

        let status_file = StatusFile::new(self.config.status_file());
        let stop_signal = StopSignal::new(self.config.stop_file());
        status_file.clear()?;
        JobStreamWriter::new(self.config.jobs_file()).clear()?;
        stop_signal.clear()?;
        run.save(self.config.run_config_file())?;
        self.status_tx.send_replace(None);

        let mut child = worker.spawn(self.config.work_dir())?;
        let process_group = child.id();
        info!(
            "Started worker pid {:?} for {} (max age {}h)",
            child.id(),
            run.site,
            run.hours
        );

        let mut tail = RunTail::new(status_file, JobStreamReader::new(self.config.jobs_file()));
        let mut stop_requested = false;

        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut exit = loop {
            ticker.tick().await;

            if tail.poll(&self.store, &self.status_tx).await {
                info!("Worker reported a terminal status");
                break None;
            }

            match child.try_wait() {
                Ok(Some(status)) => {
                    info!("Worker exited with {status}");
                    break Some(status);
                }
                Ok(None) => {}
                Err(e) => warn!("Could not poll worker: {e}"),
            }

            if stop.is_cancelled() {
                stop_requested = true;
                break self
                    .stop_worker(&mut child, &stop_signal, &mut tail)
                    .await;
            }
        };

        if let Err(e) = stop_signal.clear() {
            warn!("Failed to remove stop flag: {:#}", anyhow::Error::from(e));
        }
        tail.poll(&self.store, &self.status_tx).await;

        if exit.is_none() {
            exit = self.reap(&mut child).await;
        }
        if stop_requested {
            // A worker stopped mid-launch can leave its browser behind
            process::kill_group(process_group);
        }

        let outcome = SupervisorOutcome {
            status: tail.last_status,
            exit_code: exit.and_then(|s| s.code()),
            counts: tail.counts,
            stop_requested,
        };
        info!(
            "Run finished: {} ({} new, {} duplicate, {} failed lines)",
            outcome.final_state(),
            outcome.counts.inserted,
            outcome.counts.duplicates,
            outcome.counts.failed
        );
        Ok(outcome)
    }

    /// Stop sentinel, grace period, SIGTERM, shorter grace, kill.
    async fn stop_worker(
        &self,
        child: &mut Child,
        stop_signal: &StopSignal,
        tail: &mut RunTail,
    ) -> Option<ExitStatus> {
        info!("Requesting worker stop");
        if let Err(e) = stop_signal.request() {
            warn!("Failed to create stop flag: {:#}", anyhow::Error::from(e));
        }

        let deadline = Instant::now() + self.config.stop_grace();
        let step = self.config.poll_interval().min(Duration::from_millis(500));
        while Instant::now() < deadline {
            if let Ok(Some(status)) = child.try_wait() {
                return Some(status);
            }
            tail.poll(&self.store, &self.status_tx).await;
            tokio::time::sleep(step.min(deadline.saturating_duration_since(Instant::now())))
                .await;
        }

        warn!(
            "Worker still running {}s after stop request, terminating",
            self.config.stop_grace().as_secs()
        );
        process::terminate(child);
        if let Ok(Ok(status)) = tokio::time::timeout(self.config.terminate_grace(), child.wait()).await {
            return Some(status);
        }

        warn!("Worker ignored SIGTERM, killing");
        self.reap(child).await
    }

    /// Bounded wait for exit, killing the worker if it does not go.
    async fn reap(&self, child: &mut Child) -> Option<ExitStatus> {
        match tokio::time::timeout(self.config.terminate_grace(), child.wait()).await {
            Ok(Ok(status)) => return Some(status),
            Ok(Err(e)) => warn!("Error waiting for worker: {e}"),
            Err(_) => warn!("Worker did not exit in time, killing"),
        }

        process::kill(child);
        match tokio::time::timeout(self.config.terminate_grace(), child.wait()).await {
            Ok(Ok(status)) => Some(status),
            _ => {
                warn!("Worker could not be reaped");
                None
            }
        }
    }
}

/// Status and job-stream cursors for the run in progress.
struct RunTail {
    status_file: StatusFile,
    reader: JobStreamReader,
    last_status: Option<RunStatus>,
    counts: ForwardCounts,
}

impl RunTail {
    fn new(status_file: StatusFile, reader: JobStreamReader) -> Self {
        Self {
            status_file,
            reader,
            last_status: None,
            counts: ForwardCounts::default(),
        }
    }

    /// Forward new lines and pick up the latest status. True once the worker
    /// has written a terminal status.
    async fn poll<S: JobStore>(
        &mut self,
        store: &S,
        status_tx: &watch::Sender<Option<RunStatus>>,
    ) -> bool {
        self.forward_new_lines(store).await;
        self.observe_status(status_tx);
        self.last_status
            .as_ref()
            .is_some_and(|s| s.status.is_terminal())
    }

    async fn forward_new_lines<S: JobStore>(&mut self, store: &S) {
        let lines = match self.reader.read_new_lines() {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Failed to read job stream: {:#}", anyhow::Error::from(e));
                return;
            }
        };

        for line in lines {
            let job = match JobStreamReader::parse_line(&line) {
                Ok(job) => job,
                Err(e) => {
                    warn!("Error parsing job line: {:#}", anyhow::Error::from(e));
                    self.counts.failed += 1;
                    continue;
                }
            };
            match store.insert(&job).await {
                Ok(InsertOutcome::Inserted { id }) => {
                    debug!("Stored job {id}: {} at {}", job.title, job.company);
                    self.counts.inserted += 1;
                }
                Ok(InsertOutcome::Duplicate) => self.counts.duplicates += 1,
                Err(e) => {
                    warn!(
                        "Failed to store {} at {}: {:#}",
                        job.title,
                        job.company,
                        anyhow::Error::from(e)
                    );
                    self.counts.failed += 1;
                }
            }
        }
    }

    fn observe_status(&mut self, status_tx: &watch::Sender<Option<RunStatus>>) {
        let Some(status) = self.status_file.read() else {
            return;
        };
        if self
            .last_status
            .as_ref()
            .is_some_and(|last| last.same_state(&status))
        {
            return;
        }
        info!(
            "Worker status: {} - {} (jobs {}, page {})",
            status.status, status.message, status.jobs_scraped, status.current_page
        );
        status_tx.send_replace(Some(status.clone()));
        self.last_status = Some(status);
    }
}

/// Holds the single-run flag for the lifetime of a run.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SupervisorError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SupervisorError::AlreadyRunning)?;
        Ok(Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
