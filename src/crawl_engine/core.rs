//! The page/listing loop
//!
//! One run walks result pages newest-first until the site runs out of pages
//! or listings, a posting falls outside the age window, the run is cancelled,
//! or a page-level step fails. Site-specific work is delegated to the adapter;
//! per-listing failures never end the run.

use std::time::Duration;

use log::{debug, error, info, warn};

use super::cancellation::CancellationToken;
use super::crawl_types::{CrawlError, CrawlOutcome, CrawlSettings, JobSink, PageDriver};
use super::page_timeout::with_page_timeout;
use super::pacing;
use super::progress::StatusReporter;
use crate::exclusion::ExclusionList;
use crate::ipc::RunState;
use crate::relative_time::relative_age_hours;
use crate::sites::{Extraction, ListingHandle, SiteAdapter};

/// How often `wait_for` re-checks the listing container.
const LISTING_POLL: Duration = Duration::from_millis(250);

/// What happened to a single listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListingResult {
    Appended,
    Skipped,
    AgeLimit(u32),
}

/// Drives one adapter over one browser page.
pub struct CrawlEngine<'a, A, D> {
    adapter: &'a A,
    driver: &'a D,
    exclusions: &'a ExclusionList,
    settings: CrawlSettings,
    cancel: CancellationToken,
}

impl<'a, A, D> CrawlEngine<'a, A, D>
where
    A: SiteAdapter,
    D: PageDriver,
{
    pub fn new(
        adapter: &'a A,
        driver: &'a D,
        exclusions: &'a ExclusionList,
        settings: CrawlSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            adapter,
            driver,
            exclusions,
            settings,
            cancel,
        }
    }

    /// Run the crawl to a terminal outcome. `Running` transitions go to
    /// `reporter`; the terminal status is left to the caller, which still has
    /// teardown to do.
    pub async fn run<R, S>(&self, reporter: &R, sink: &S) -> CrawlOutcome
    where
        R: StatusReporter,
        S: JobSink,
    {
        let site = self.adapter.site();
        let mut page: u32 = 1;
        let mut jobs: u32 = 0;

        info!("Starting {site} crawl, max age {}h", self.settings.max_age_hours);

        loop {
            if self.cancel.is_cancelled() {
                return CrawlOutcome::stopped(jobs, page);
            }

            reporter.report(
                RunState::Running,
                &format!("Scraping page {page}..."),
                jobs,
                page,
            );
            info!("Scraping page {page}...");

            if let Err(e) = self.load_page(page).await {
                error!("{e}");
                return CrawlOutcome::failed(&e, jobs, page);
            }

            if self.cancel.is_cancelled() {
                return CrawlOutcome::stopped(jobs, page);
            }

            self.settings.pacing.pause(pacing::BEFORE_SCROLL).await;
            self.human_scroll().await;
            self.settings.pacing.pause(pacing::AFTER_SCROLL).await;

            if self.cancel.is_cancelled() {
                return CrawlOutcome::stopped(jobs, page);
            }

            let listings = match self.adapter.find_listings().await {
                Ok(listings) => listings,
                Err(e) => {
                    warn!("Listing lookup failed on page {page}: {e:#}");
                    Vec::new()
                }
            };
            if listings.is_empty() {
                warn!("No job listings found on page {page}");
                return CrawlOutcome::completed("No more job listings found", jobs, page);
            }
            debug!("Found {} listings on page {page}", listings.len());

            if let Err(e) = self.adapter.handle_popup_if_present().await {
                warn!("Error handling popup: {e:#}");
            }

            let mut age_limit = None;
            for (index, listing) in listings.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    info!("Stop requested before listing {}", index + 1);
                    return CrawlOutcome::stopped(jobs, page);
                }

                match self.process_listing(listing, sink).await {
                    ListingResult::Appended => jobs += 1,
                    ListingResult::Skipped => {}
                    ListingResult::AgeLimit(age) => {
                        age_limit = Some(age);
                        break;
                    }
                }
            }

            if self.cancel.is_cancelled() {
                return CrawlOutcome::stopped(jobs, page);
            }

            if let Some(age) = age_limit {
                info!("Time limit reached ({age}h > {}h). Ending scrape.", self.settings.max_age_hours);
                return CrawlOutcome::completed(
                    format!("Scraping completed. Total jobs scraped: {jobs}"),
                    jobs,
                    page,
                );
            }

            match self.adapter.go_to_next_page().await {
                Ok(true) => {
                    page += 1;
                    self.settings.pacing.pause(pacing::AFTER_PAGE_CHANGE).await;
                }
                Ok(false) => {
                    info!("No next page found. Ending scrape.");
                    return CrawlOutcome::completed(
                        format!("No next page. Scraped {jobs} jobs."),
                        jobs,
                        page,
                    );
                }
                Err(e) => {
                    let err = CrawlError::Pagination {
                        page,
                        message: format!("{e:#}"),
                    };
                    error!("{err}");
                    return CrawlOutcome::failed(&err, jobs, page);
                }
            }
        }
    }

    /// Navigate to `page` and wait for its listing container.
    async fn load_page(&self, page: u32) -> Result<(), CrawlError> {
        let url = self.adapter.page_url(page);
        debug!("Loading {url}");

        with_page_timeout(
            self.driver.goto(&url),
            self.settings.navigation_timeout_secs,
            "Navigation",
        )
        .await
        .map_err(|e| CrawlError::Navigation {
            page,
            message: format!("{e:#}"),
        })?;

        with_page_timeout(
            self.driver.wait_for(self.adapter.content_selector(), LISTING_POLL),
            self.settings.listing_wait(page),
            "Listing wait",
        )
        .await
        .map_err(|_| CrawlError::ListingTimeout { page })?;

        self.settings.pacing.pause(pacing::SETTLE_AFTER_WAIT).await;
        Ok(())
    }

    async fn human_scroll(&self) {
        for dy in self.settings.pacing.scroll_plan() {
            if let Err(e) = self.driver.scroll_by(dy).await {
                debug!("Scroll step failed: {e:#}");
                break;
            }
            self.settings.pacing.pause(pacing::BETWEEN_SCROLL_STEPS).await;
        }
    }

    async fn process_listing<S: JobSink>(&self, listing: &A::Listing, sink: &S) -> ListingResult {
        if let Err(e) = listing.point_at().await {
            warn!("Could not move to listing: {e:#}");
            return ListingResult::Skipped;
        }
        self.settings.pacing.pause(pacing::HOVER).await;

        let job = match self.adapter.extract_job(listing).await {
            Ok(Extraction::Job(job)) => job,
            Ok(Extraction::Skip) => return ListingResult::Skipped,
            Ok(Extraction::AgeLimit { age_hours }) => return ListingResult::AgeLimit(age_hours),
            Err(e) => {
                warn!("Skipped job due to extraction error: {e:#}");
                return ListingResult::Skipped;
            }
        };

        // Age precedes exclusion so an old excluded posting still ends the run.
        let age = relative_age_hours(&job.posted_raw);
        if age > self.settings.max_age_hours {
            info!("Reached postings from {} ({age}h ago). Stopping.", job.posted_raw);
            return ListingResult::AgeLimit(age);
        }

        if !job.is_complete() {
            warn!("Skipping job due to missing critical data");
            return ListingResult::Skipped;
        }

        if self.exclusions.is_excluded(&job.title, &job.company) {
            info!("Excluded: {}, Posted: {}", job.title, job.posted_raw);
            return ListingResult::Skipped;
        }

        match sink.append(&job) {
            Ok(()) => {
                info!("SCRAPED: {} at {}", job.title, job.company);
                ListingResult::Appended
            }
            Err(e) => {
                error!("Error writing job data: {:#}", anyhow::Error::from(e));
                ListingResult::Skipped
            }
        }
    }
}
