//! AllJobs listing pages
//!
//! Every field is read straight from the listing card. Location and type sit
//! next to an icon, so their value is the second child node of the element.
//! The description is the upper summary plus the full text of the lower
//! block. A promotional modal sometimes covers the page and is closed through
//! its close control.

use async_trait::async_trait;
use chromiumoxide::{Element, Page};
use tracing::{debug, info, warn};

use super::{
    Extraction, SiteAdapter, SiteId, child_href, child_text, click_next_page, js_click,
    read_optional, second_child_text, text_content,
};
use crate::config::{ConfigError, SiteConfig};
use crate::crawl_engine::pacing::{self, Pacing};
use crate::job::JobPosting;
use crate::relative_time::{posted_timestamp_now, relative_age_hours};

const HIDDEN_STYLE: &str = "display: none";

pub struct AllJobsAdapter {
    page: Page,
    config: SiteConfig,
    max_age_hours: u32,
    pacing: Pacing,

    content: String,
    listings: String,
    title: String,
    company: String,
    time_posted: String,
    pager: String,
    next_button: String,

    link: Option<String>,
    location: Option<String>,
    job_type: Option<String>,
    body_upper: Option<String>,
    body_lower: Option<String>,
    popup: Option<(String, Option<String>)>,
}

impl AllJobsAdapter {
    pub fn new(
        page: Page,
        config: SiteConfig,
        max_age_hours: u32,
        pacing: Pacing,
    ) -> Result<Self, ConfigError> {
        let site = SiteId::AllJobs;
        let title = config.require(site, "title", |s| &s.title)?;
        let popup = config
            .optional(|s| &s.popup)
            .map(|popup| (popup, config.optional(|s| &s.popup_close)));

        Ok(Self {
            content: config.require(site, "content", |s| &s.content)?,
            listings: config.require(site, "listings", |s| &s.listings)?,
            company: config.require(site, "company", |s| &s.company)?,
            time_posted: config.require(site, "time_posted", |s| &s.time_posted)?,
            pager: config.require(site, "pager", |s| &s.pager)?,
            next_button: config.require(site, "next_button", |s| &s.next_button)?,
            // The title anchor doubles as the link unless configured apart
            link: config.optional(|s| &s.link).or_else(|| Some(title.clone())),
            location: config.optional(|s| &s.location),
            job_type: config.optional(|s| &s.job_type),
            body_upper: config.optional(|s| &s.body_upper),
            body_lower: config.optional(|s| &s.body_lower),
            title,
            popup,
            page,
            config,
            max_age_hours,
            pacing,
        })
    }
}

#[async_trait]
impl SiteAdapter for AllJobsAdapter {
    type Listing = Element;

    fn site(&self) -> SiteId {
        SiteId::AllJobs
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
        let (Some(title), Some(company)) = (
            child_text(listing, &self.title).await,
            child_text(listing, &self.company).await,
        ) else {
            warn!("Skipped job due to missing title or company");
            return Ok(Extraction::Skip);
        };

        let posted_raw = child_text(listing, &self.time_posted)
            .await
            .unwrap_or_default();
        let age_hours = relative_age_hours(&posted_raw);
        if age_hours > self.max_age_hours {
            return Ok(Extraction::AgeLimit { age_hours });
        }

        let link = read_optional(&self.link, |s| child_href(listing, s)).await;
        let location = read_optional(&self.location, |s| second_child_text(listing, s)).await;
        let job_type = read_optional(&self.job_type, |s| second_child_text(listing, s)).await;
        let upper = read_optional(&self.body_upper, |s| child_text(listing, s)).await;
        let lower = read_optional(&self.body_lower, |s| text_content(listing, s)).await;

        let job = JobPosting::new(
            SiteId::AllJobs,
            &title,
            &company,
            &posted_raw,
            posted_timestamp_now(&posted_raw),
            link,
            location,
            job_type,
            &[upper, lower],
        );
        Ok(job.map_or(Extraction::Skip, Extraction::Job))
    }

    async fn handle_popup_if_present(&self) -> anyhow::Result<()> {
        let Some((popup_selector, close_selector)) = &self.popup else {
            return Ok(());
        };
        let Ok(popup) = self.page.find_element(popup_selector.as_str()).await else {
            debug!("No popup on page");
            return Ok(());
        };

        let style = popup.attribute("style").await?.unwrap_or_default();
        if style.contains(HIDDEN_STYLE) {
            return Ok(());
        }

        info!("Popup detected");
        let Some(close_selector) = close_selector else {
            warn!("Popup visible but no close selector configured");
            return Ok(());
        };
        match self.page.find_element(close_selector.as_str()).await {
            Ok(close) => {
                js_click(&close).await?;
                info!("Popup closed");
                self.pacing.pause(pacing::AFTER_POPUP_CLOSE).await;
            }
            Err(_) => warn!("Popup visible but its close control was not found"),
        }
        Ok(())
    }

    async fn go_to_next_page(&self) -> anyhow::Result<bool> {
        click_next_page(&self.page, &self.pager, &self.next_button, &self.pacing).await
    }
}
