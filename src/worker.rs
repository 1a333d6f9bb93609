//! Worker process main routine
//!
//! Reads the run configuration, acquires a browser session, builds the
//! adapter for the configured site and drives the crawl engine until it
//! reaches a terminal outcome or the process receives SIGINT/SIGTERM. The
//! session is released on every path before the terminal status is written.

use std::future::Future;

use anyhow::Context;
#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::{error, info, warn};

use crate::browser_session::{BrowserPage, BrowserSession};
use crate::config::{RunConfig, ScraperConfig, SiteConfig};
use crate::crawl_engine::{
    CancellationToken, CleanupResult, CrawlEngine, CrawlOutcome, CrawlSettings, StatusReporter,
    cleanup,
};
use crate::exclusion::ExclusionList;
use crate::ipc::{JobStreamWriter, RunState, StatusFile};
use crate::sites::{AllJobsAdapter, JobmasterAdapter, SiteId};

/// Run one scrape and return its terminal state. Never panics on run
/// failures; they end up in the status file.
///
/// SIGINT/SIGTERM handlers are installed before anything else, so a signal at
/// any point, browser launch included, ends in the regular release path.
pub async fn run_worker(config: &ScraperConfig) -> RunState {
    let mut shutdown = Shutdown::install();
    run_worker_until(config, shutdown.recv()).await
}

/// [`run_worker`] with a caller-supplied shutdown trigger. When `shutdown`
/// resolves first, the run is abandoned and reported as stopped.
pub async fn run_worker_until<F>(config: &ScraperConfig, shutdown: F) -> RunState
where
    F: Future<Output = &'static str>,
{
    let status = StatusFile::new(config.status_file());
    let jobs = JobStreamWriter::new(config.jobs_file());

    // This process is the only writer of both files for the run
    if let Err(e) = status.clear() {
        warn!("Could not remove previous status file: {:#}", anyhow::Error::from(e));
    }
    if let Err(e) = jobs.clear() {
        warn!("Could not remove previous job stream: {:#}", anyhow::Error::from(e));
    }
    status.report(RunState::Starting, "Initializing scraper...", 0, 1);

    let mut session = None;
    let mut interrupted = false;
    let result = tokio::select! {
        result = scrape(config, &status, &jobs, &mut session) => result,
        signal = shutdown => {
            info!("Received {signal}, stopping");
            interrupted = true;
            let (jobs_scraped, current_page) = last_progress(&status);
            Ok(CrawlOutcome {
                state: RunState::Stopped,
                message: "Process terminated by signal".to_string(),
                jobs_scraped,
                current_page,
            })
        }
    };

    match session.take() {
        Some(mut session) => {
            if let CleanupResult::PartialFailure(errors) = session.release().await {
                warn!("Browser cleanup incomplete: {}", errors.join("; "));
            }
        }
        None if interrupted => {
            // An interrupted launch has no session to release; its browser
            // and profile go with the dropped future, stragglers go here
            let killed = cleanup::kill_orphaned_browsers(None);
            if killed > 0 {
                info!("Killed {killed} browser processes left by an interrupted launch");
            }
        }
        None => {}
    }

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Scraper error: {e:#}");
            let (jobs_scraped, page) = last_progress(&status);
            CrawlOutcome {
                state: RunState::Error,
                message: format!("Scraper error: {e:#}"),
                jobs_scraped,
                current_page: page,
            }
        }
    };

    info!("Worker finished: {} - {}", outcome.state, outcome.message);
    status.report(
        outcome.state,
        &outcome.message,
        outcome.jobs_scraped,
        outcome.current_page,
    );
    outcome.state
}

async fn scrape(
    config: &ScraperConfig,
    status: &StatusFile,
    jobs: &JobStreamWriter,
    session: &mut Option<BrowserSession>,
) -> anyhow::Result<CrawlOutcome> {
    let run = RunConfig::load(config.run_config_file()).context("Invalid run configuration")?;
    let site_config = SiteConfig::load(config.sites_dir(), run.site)?;
    let exclusions = ExclusionList::load(config.excluded_words_file());
    let settings = CrawlSettings::from_config(config, run.hours);
    let cancel = CancellationToken::watching(config.stop_file());

    info!("Worker starting: site {}, max age {}h", run.site, run.hours);

    let session = session.insert(BrowserSession::acquire(config.headless()).await?);
    let page = session.page()?;
    let driver = BrowserPage::new(page.clone());

    let outcome = match run.site {
        SiteId::AllJobs => {
            let adapter = AllJobsAdapter::new(page, site_config, run.hours, settings.pacing)?;
            CrawlEngine::new(&adapter, &driver, &exclusions, settings, cancel)
                .run(status, jobs)
                .await
        }
        SiteId::Jobmaster => {
            let adapter = JobmasterAdapter::new(page, site_config, run.hours, settings.pacing)?;
            CrawlEngine::new(&adapter, &driver, &exclusions, settings, cancel)
                .run(status, jobs)
                .await
        }
    };
    Ok(outcome)
}

/// Counters from the last status this worker wrote.
fn last_progress(status: &StatusFile) -> (u32, u32) {
    status
        .read()
        .map_or((0, 1), |s| (s.jobs_scraped, s.current_page))
}

/// Termination signal streams, registered when constructed.
struct Shutdown {
    #[cfg(unix)]
    interrupt: Option<Signal>,
    #[cfg(unix)]
    terminate: Option<Signal>,
}

impl Shutdown {
    #[cfg(unix)]
    fn install() -> Self {
        let register = |kind: SignalKind, name: &str| match signal(kind) {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!("Could not install {name} handler: {e}");
                None
            }
        };
        Self {
            interrupt: register(SignalKind::interrupt(), "SIGINT"),
            terminate: register(SignalKind::terminate(), "SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    fn install() -> Self {
        Self {}
    }

    /// Resolves with the signal name; never resolves if no handler could be
    /// installed.
    #[cfg(unix)]
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            Some(()) = recv_from(&mut self.interrupt) => "SIGINT",
            Some(()) = recv_from(&mut self.terminate) => "SIGTERM",
            else => std::future::pending().await,
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Could not listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
        "Ctrl-C"
    }
}

#[cfg(unix)]
async fn recv_from(stream: &mut Option<Signal>) -> Option<()> {
    match stream {
        Some(stream) => stream.recv().await,
        None => None,
    }
}
