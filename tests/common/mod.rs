//! In-memory doubles for driving the crawl engine without a browser

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use jobhound::crawl_engine::{CrawlSettings, JobSink, Pacing, PageDriver, StatusReporter};
use jobhound::ipc::{IpcError, RunState};
use jobhound::job::JobPosting;
use jobhound::sites::{Extraction, ListingHandle, SiteAdapter, SiteId};

pub const BASE_URL: &str = "https://jobs.test/list?page=";

/// Hour label in the sites' format.
pub fn hours_ago(hours: u32) -> String {
    format!("לפני {hours} שעות")
}

pub fn job(title: &str, company: &str, posted: &str) -> JobPosting {
    JobPosting::new(
        SiteId::AllJobs,
        title,
        company,
        posted,
        "2026-01-01 10:00:00".to_string(),
        Some(format!("https://jobs.test/job/{title}")),
        None,
        None,
        &[Some("description".to_string())],
    )
    .expect("test job has title and company")
}

/// An extraction that yields a fresh posting.
pub fn fresh(title: &str, company: &str) -> Extraction {
    Extraction::Job(job(title, company, &hours_ago(1)))
}

pub fn settings(max_age_hours: u32) -> CrawlSettings {
    CrawlSettings {
        max_age_hours,
        pacing: Pacing::none(),
        navigation_timeout_secs: 30,
        listing_wait_secs: 10,
        deep_listing_wait_secs: 15,
        deep_page_threshold: 10,
    }
}

#[derive(Debug, Clone)]
pub struct MockListing {
    pub page: u32,
    pub index: usize,
    pub extraction: Extraction,
    pub pointer_fails: bool,
}

#[async_trait]
impl ListingHandle for MockListing {
    async fn point_at(&self) -> anyhow::Result<()> {
        if self.pointer_fails {
            anyhow::bail!("element not interactable");
        }
        Ok(())
    }
}

type ExtractHook = Box<dyn Fn(u32, usize) + Send + Sync>;

/// Scripted site: one list of extractions per page.
pub struct MockAdapter {
    pages: Vec<Vec<Extraction>>,
    current: Mutex<u32>,
    extracted: Mutex<Vec<(u32, usize)>>,
    pointer_failures: Vec<(u32, usize)>,
    pagination_error_on: Option<u32>,
    after_extract: Option<ExtractHook>,
}

impl MockAdapter {
    pub fn new(pages: Vec<Vec<Extraction>>) -> Self {
        Self {
            pages,
            current: Mutex::new(1),
            extracted: Mutex::new(Vec::new()),
            pointer_failures: Vec::new(),
            pagination_error_on: None,
            after_extract: None,
        }
    }

    pub fn with_pointer_failure(mut self, page: u32, index: usize) -> Self {
        self.pointer_failures.push((page, index));
        self
    }

    pub fn with_pagination_error_on(mut self, page: u32) -> Self {
        self.pagination_error_on = Some(page);
        self
    }

    /// Run `hook(page, index)` after each extraction.
    pub fn after_extract(mut self, hook: impl Fn(u32, usize) + Send + Sync + 'static) -> Self {
        self.after_extract = Some(Box::new(hook));
        self
    }

    /// `(page, index)` of every listing handed to `extract_job`, in order.
    pub fn extracted(&self) -> Vec<(u32, usize)> {
        self.extracted.lock().expect("lock").clone()
    }

    pub fn current_page(&self) -> u32 {
        *self.current.lock().expect("lock")
    }
}

#[async_trait]
impl SiteAdapter for MockAdapter {
    type Listing = MockListing;

    fn site(&self) -> SiteId {
        SiteId::AllJobs
    }

    fn page_url(&self, page: u32) -> String {
        format!("{BASE_URL}{page}")
    }

    fn content_selector(&self) -> &str {
        ".job-content"
    }

    async fn find_listings(&self) -> anyhow::Result<Vec<MockListing>> {
        let page = self.current_page();
        let Some(extractions) = self.pages.get(page as usize - 1) else {
            return Ok(Vec::new());
        };
        Ok(extractions
            .iter()
            .enumerate()
            .map(|(index, extraction)| MockListing {
                page,
                index,
                extraction: extraction.clone(),
                pointer_fails: self.pointer_failures.contains(&(page, index)),
            })
            .collect())
    }

    async fn extract_job(&self, listing: &MockListing) -> anyhow::Result<Extraction> {
        self.extracted
            .lock()
            .expect("lock")
            .push((listing.page, listing.index));
        if let Some(hook) = &self.after_extract {
            hook(listing.page, listing.index);
        }
        Ok(listing.extraction.clone())
    }

    async fn handle_popup_if_present(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn go_to_next_page(&self) -> anyhow::Result<bool> {
        let mut current = self.current.lock().expect("lock");
        if self.pagination_error_on == Some(*current) {
            anyhow::bail!("next button detached");
        }
        if (*current as usize) < self.pages.len() {
            *current += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Page driver that records navigation and never touches a browser.
#[derive(Default)]
pub struct MockDriver {
    pub visited: Mutex<Vec<String>>,
    pub scrolls: Mutex<Vec<i64>>,
    pub fail_navigation: bool,
    pub never_render: bool,
}

impl MockDriver {
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().expect("lock").clone()
    }

    pub fn scroll_count(&self) -> usize {
        self.scrolls.lock().expect("lock").len()
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn goto(&self, url: &str) -> anyhow::Result<()> {
        if self.fail_navigation {
            anyhow::bail!("net::ERR_CONNECTION_RESET");
        }
        self.visited.lock().expect("lock").push(url.to_string());
        Ok(())
    }

    async fn wait_for(&self, _selector: &str, _poll: Duration) -> anyhow::Result<()> {
        if self.never_render {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn scroll_by(&self, dy: i64) -> anyhow::Result<()> {
        self.scrolls.lock().expect("lock").push(dy);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    jobs: Mutex<Vec<JobPosting>>,
}

impl RecordingSink {
    pub fn jobs(&self) -> Vec<JobPosting> {
        self.jobs.lock().expect("lock").clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.jobs().into_iter().map(|j| j.title).collect()
    }
}

impl JobSink for RecordingSink {
    fn append(&self, job: &JobPosting) -> Result<(), IpcError> {
        self.jobs.lock().expect("lock").push(job.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(RunState, String, u32, u32)>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<(RunState, String, u32, u32)> {
        self.reports.lock().expect("lock").clone()
    }
}

impl StatusReporter for RecordingReporter {
    fn report(&self, state: RunState, message: &str, jobs_scraped: u32, current_page: u32) {
        self.reports
            .lock()
            .expect("lock")
            .push((state, message.to_string(), jobs_scraped, current_page));
    }
}
