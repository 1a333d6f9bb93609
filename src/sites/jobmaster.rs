//! Jobmaster listing pages
//!
//! Cards carry title, company, location, type and posted time. The full
//! description lives in a side panel that opens when the listing link is
//! clicked; the card's short description is used when the panel does not
//! show up. Promoted cards are skipped.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Element, Page};
use tracing::{debug, info, warn};

use super::{
    Extraction, SiteAdapter, SiteId, child_text, click_next_page, element_href, js_click,
    read_optional, wait_for_element,
};
use crate::config::{ConfigError, SiteConfig};
use crate::crawl_engine::pacing::{self, Pacing};
use crate::crawl_engine::with_page_timeout;
use crate::job::JobPosting;
use crate::relative_time::{posted_timestamp_now, relative_age_hours};

/// Marker in the markup of promoted listings.
const PROMOTED_MARKER: &str = "mekudam";

const DEFAULT_DETAIL_PANEL: &str = "#enterJob";
const DEFAULT_DETAIL_DESCRIPTION: &str = ".jobDescription";

const PANEL_TIMEOUT_SECS: u64 = 5;
const PANEL_POLL: Duration = Duration::from_millis(200);

pub struct JobmasterAdapter {
    page: Page,
    config: SiteConfig,
    max_age_hours: u32,
    pacing: Pacing,

    content: String,
    listings: String,
    title: String,
    company: String,
    pager: String,
    next_button: String,
    detail_panel: String,
    detail_description: String,

    time_posted: Option<String>,
    link: Option<String>,
    location: Option<String>,
    job_type: Option<String>,
    short_description: Option<String>,
}

impl JobmasterAdapter {
    pub fn new(
        page: Page,
        config: SiteConfig,
        max_age_hours: u32,
        pacing: Pacing,
    ) -> Result<Self, ConfigError> {
        let site = SiteId::Jobmaster;
        Ok(Self {
            content: config.require(site, "content", |s| &s.content)?,
            listings: config.require(site, "listings", |s| &s.listings)?,
            title: config.require(site, "title", |s| &s.title)?,
            company: config.require(site, "company", |s| &s.company)?,
            pager: config.require(site, "pager", |s| &s.pager)?,
            next_button: config.require(site, "next_button", |s| &s.next_button)?,
            detail_panel: config
                .optional(|s| &s.detail_panel)
                .unwrap_or_else(|| DEFAULT_DETAIL_PANEL.to_string()),
            detail_description: config
                .optional(|s| &s.detail_description)
                .unwrap_or_else(|| DEFAULT_DETAIL_DESCRIPTION.to_string()),
            time_posted: config.optional(|s| &s.time_posted),
            link: config.optional(|s| &s.link),
            location: config.optional(|s| &s.location),
            job_type: config.optional(|s| &s.job_type),
            short_description: config.optional(|s| &s.body_upper),
            page,
            config,
            max_age_hours,
            pacing,
        })
    }

    async fn is_promoted(listing: &Element) -> bool {
        match listing.outer_html().await {
            Ok(Some(html)) => html.to_lowercase().contains(PROMOTED_MARKER),
            _ => false,
        }
    }

    /// Open the listing's side panel and read the full description.
    async fn read_side_panel(&self, link: &Element) -> Option<String> {
        if let Err(e) = link
            .call_js_fn(
                "function() { this.scrollIntoView({block: 'center'}); }",
                false,
            )
            .await
        {
            debug!("Could not scroll listing link into view: {e}");
        }
        self.pacing.pause(pacing::BEFORE_LISTING_CLICK).await;

        if link.click().await.is_err()
            && let Err(e) = js_click(link).await
        {
            warn!("Could not open job panel: {e}");
            return None;
        }

        let panel = match with_page_timeout(
            wait_for_element(&self.page, &self.detail_panel, PANEL_POLL),
            PANEL_TIMEOUT_SECS,
            "Job panel",
        )
        .await
        {
            Ok(panel) => panel,
            Err(e) => {
                warn!("Job panel did not open: {e}");
                return None;
            }
        };
        self.pacing.pause(pacing::PANEL_SETTLE).await;

        child_text(&panel, &self.detail_description)
            .await
            .filter(|text| !text.is_empty())
    }
}

#[async_trait]
impl SiteAdapter for JobmasterAdapter {
    type Listing = Element;

    fn site(&self) -> SiteId {
        SiteId::Jobmaster
    }

    fn page_url(&self, page: u32) -> String {
        self.config.page_url(page)
    }

    fn content_selector(&self) -> &str {
        &self.content
    }

    async fn find_listings(&self) -> anyhow::Result<Vec<Element>> {
        Ok(self.page.find_elements(self.listings.as_str()).await?)
    }

    async fn extract_job(&self, listing: &Element) -> anyhow::Result<Extraction> {
        if Self::is_promoted(listing).await {
            debug!("Skipping promoted listing");
            return Ok(Extraction::Skip);
        }

        let (Some(title), Some(company)) = (
            child_text(listing, &self.title).await,
            child_text(listing, &self.company).await,
        ) else {
            warn!("Skipped job due to missing title or company");
            return Ok(Extraction::Skip);
        };

        let posted_raw = read_optional(&self.time_posted, |s| child_text(listing, s))
            .await
            .unwrap_or_default();
        // Checked before the panel click so an old listing costs no navigation
        let age_hours = relative_age_hours(&posted_raw);
        if age_hours > self.max_age_hours {
            return Ok(Extraction::AgeLimit { age_hours });
        }

        let location = read_optional(&self.location, |s| child_text(listing, s)).await;
        let job_type = read_optional(&self.job_type, |s| child_text(listing, s)).await;
        let short_description =
            read_optional(&self.short_description, |s| child_text(listing, s)).await;

        let link_element = match &self.link {
            Some(selector) => listing.find_element(selector.as_str()).await.ok(),
            None => None,
        };
        let (link, full_description) = match &link_element {
            Some(element) => (
                element_href(element).await,
                self.read_side_panel(element).await,
            ),
            None => (None, None),
        };
        if full_description.is_none() && link_element.is_some() {
            info!("Using short description for {title}");
        }

        let description = full_description.or(short_description);
        let job = JobPosting::new(
            SiteId::Jobmaster,
            &title,
            &company,
            &posted_raw,
            posted_timestamp_now(&posted_raw),
            link,
            location,
            job_type,
            &[description],
        );
        Ok(job.map_or(Extraction::Skip, Extraction::Job))
    }

    async fn handle_popup_if_present(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn go_to_next_page(&self) -> anyhow::Result<bool> {
        click_next_page(&self.page, &self.pager, &self.next_button, &self.pacing).await
    }
}
