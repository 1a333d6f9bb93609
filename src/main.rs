// jobhound: scrape job boards through a supervised browser worker.
//
// `scrape` runs the supervisor in this process and the crawl in a child
// `worker` process; `jobs` works on the stored postings.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use jobhound::config::{RunConfig, ScraperConfig, SiteConfig};
use jobhound::crawl_engine::CancellationToken;
use jobhound::ipc::{RunState, StatusFile};
use jobhound::sites::SiteId;
use jobhound::storage::{JobStore, SqliteJobStore, default_database_path};
use jobhound::supervisor::{Supervisor, WorkerCommand};

#[derive(Parser)]
#[command(name = "jobhound")]
#[command(about = "Scrape new job postings from Israeli job boards")]
#[command(version)]
struct Cli {
    /// Directory holding the status, job stream, stop flag and run config files
    #[arg(long, global = true, env = "JOBHOUND_WORK_DIR", default_value = ".")]
    work_dir: PathBuf,

    /// Directory with `<site>.json` selector files (default: <work_dir>/sites)
    #[arg(long, global = true)]
    sites_dir: Option<PathBuf>,

    /// Excluded-words file (default: <work_dir>/excludedwords.json)
    #[arg(long, global = true)]
    excluded_words: Option<PathBuf>,

    /// SQLite database for scraped postings
    #[arg(long, global = true, env = "JOBHOUND_DB")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a supervised scrape and store the results
    Scrape {
        #[arg(long)]
        site: SiteId,

        /// Collect postings up to this many hours old
        #[arg(long, default_value_t = 24)]
        hours: u32,

        /// Show the browser window
        #[arg(long)]
        headed: bool,
    },

    /// Worker process entry point, normally started by `scrape`
    #[command(hide = true)]
    Worker {
        #[arg(long)]
        headed: bool,
    },

    /// List supported sites and whether their selector files load
    Sites,

    /// Print the last status written by a worker
    Status,

    /// Work with stored postings
    Jobs {
        #[command(subcommand)]
        action: JobsCommand,
    },
}

#[derive(Subcommand)]
enum JobsCommand {
    /// Unseen first, then newest
    List {
        #[arg(short, long)]
        limit: Option<u32>,

        #[arg(long)]
        json: bool,
    },
    /// Mark a posting as seen
    Seen { id: i64 },
    /// Set a review status, or clear it when omitted
    Status { id: i64, status: Option<String> },
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Scrape { site, hours, headed } => {
            let _guard = init_tracing(None)?;
            scrape(&cli, *site, *hours, !headed).await
        }
        Command::Worker { headed } => {
            let config = scraper_config(&cli, !headed)?;
            let _guard = init_tracing(Some(config.log_dir()))?;
            let state = jobhound::worker::run_worker(&config).await;
            Ok(exit_code(state))
        }
        Command::Sites => {
            let config = scraper_config(&cli, true)?;
            for site in SiteId::all() {
                match SiteConfig::load(config.sites_dir(), *site) {
                    Ok(site_config) => println!("{site:<10} {}", site_config.base_url),
                    Err(e) => println!("{site:<10} not configured: {:#}", anyhow::Error::from(e)),
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            let config = scraper_config(&cli, true)?;
            match StatusFile::new(config.status_file()).read() {
                Some(status) => println!("{}", serde_json::to_string_pretty(&status)?),
                None => println!("No status available"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Jobs { action } => {
            let _guard = init_tracing(None)?;
            let store = open_store(&cli).await?;
            let result = jobs(&store, action).await;
            store.close().await;
            result
        }
    }
}

async fn scrape(cli: &Cli, site: SiteId, hours: u32, headless: bool) -> Result<ExitCode> {
    let config = scraper_config(cli, headless)?;
    let run = RunConfig::new(hours, site)?;
    let worker = WorkerCommand::current_exe(&config).context("Cannot locate own executable")?;
    let store = open_store(cli).await?;
    let supervisor = Supervisor::new(config, store);

    let stop = CancellationToken::new();
    let stop_on_ctrl_c = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping worker");
            stop_on_ctrl_c.cancel();
        }
    });

    let mut updates = supervisor.subscribe();
    let mirror = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let current = updates.borrow_and_update().clone();
            if let Some(status) = current {
                println!(
                    "[{}] {} (jobs: {}, page: {})",
                    status.status, status.message, status.jobs_scraped, status.current_page
                );
            }
        }
    });

    let outcome = supervisor.run(&run, &worker, stop).await?;
    mirror.abort();
    supervisor.store().close().await;

    println!(
        "{}: {} | {} new, {} already stored, {} failed",
        outcome.final_state(),
        outcome.message(),
        outcome.counts.inserted,
        outcome.counts.duplicates,
        outcome.counts.failed
    );
    Ok(exit_code(outcome.final_state()))
}

async fn jobs(store: &SqliteJobStore, action: &JobsCommand) -> Result<ExitCode> {
    let found = match action {
        JobsCommand::List { limit, json } => {
            let jobs = store.list(*limit).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&jobs)?);
            } else {
                for job in &jobs {
                    println!(
                        "{:>6} {} {:<19} {} | {} | {} | {}",
                        job.id,
                        if job.is_new { '*' } else { ' ' },
                        job.posted_at.as_deref().unwrap_or(""),
                        job.title,
                        job.company,
                        job.location.as_deref().unwrap_or(""),
                        job.status.as_deref().unwrap_or("-"),
                    );
                }
            }
            true
        }
        JobsCommand::Seen { id } => store.mark_seen(*id).await?,
        JobsCommand::Status { id, status } => store.set_status(*id, status.as_deref()).await?,
        JobsCommand::Delete { id } => store.delete(*id).await?,
    };

    if found {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("No such job");
        Ok(ExitCode::FAILURE)
    }
}

fn scraper_config(cli: &Cli, headless: bool) -> Result<ScraperConfig> {
    let mut builder = ScraperConfig::builder()
        .work_dir(&cli.work_dir)
        .headless(headless);
    if let Some(dir) = &cli.sites_dir {
        builder = builder.sites_dir(dir);
    }
    if let Some(path) = &cli.excluded_words {
        builder = builder.excluded_words_file(path);
    }
    Ok(builder.build()?)
}

async fn open_store(cli: &Cli) -> Result<SqliteJobStore> {
    let path = cli.database.clone().unwrap_or_else(default_database_path);
    SqliteJobStore::open(&path)
        .await
        .with_context(|| format!("Failed to open database {}", path.display()))
}

fn exit_code(state: RunState) -> ExitCode {
    match state {
        RunState::Error => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

/// Console logging filtered by `RUST_LOG` (default `info`), plus a daily
/// log file when `log_dir` is given.
fn init_tracing(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console)
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("worker")
        .filename_suffix("log")
        .max_log_files(14)
        .build(log_dir)
        .context("Failed to create log file appender")?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();
    Ok(Some(guard))
}
