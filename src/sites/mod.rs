//! Site adapters
//!
//! Each supported listing site gets one adapter implementing [`SiteAdapter`].
//! The crawl engine is generic over the adapter, so dispatch on [`SiteId`]
//! happens exactly once, when the worker builds the adapter.

pub mod alljobs;
pub mod jobmaster;

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Element, Page};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ConfigError;
use crate::crawl_engine::pacing::{self, Pacing};
use crate::job::JobPosting;

pub use alljobs::AllJobsAdapter;
pub use jobmaster::JobmasterAdapter;

/// Supported listing sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteId {
    AllJobs,
    Jobmaster,
}

impl SiteId {
    #[must_use]
    pub const fn all() -> &'static [SiteId] {
        &[SiteId::AllJobs, SiteId::Jobmaster]
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AllJobs => "alljobs",
            Self::Jobmaster => "jobmaster",
        }
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|site| site.as_str() == wanted)
            .ok_or_else(|| ConfigError::UnknownSite(s.to_string()))
    }
}

/// Result of extracting one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Job(JobPosting),
    /// Missing data or a listing the site marks as not worth keeping.
    Skip,
    /// This listing, and under newest-first ordering every later one, is
    /// older than the run's window.
    AgeLimit { age_hours: u32 },
}

/// A listing element the engine can point at before extraction.
#[async_trait]
pub trait ListingHandle: Send + Sync {
    /// Move the pointer over the listing, scrolling it into view first.
    async fn point_at(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl ListingHandle for Element {
    async fn point_at(&self) -> anyhow::Result<()> {
        self.scroll_into_view().await?;
        self.hover().await?;
        Ok(())
    }
}

/// Site-specific listing discovery, extraction, popups and pagination.
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    type Listing: ListingHandle;

    fn site(&self) -> SiteId;

    /// URL of the given 1-based results page.
    fn page_url(&self, page: u32) -> String;

    /// Selector whose presence means the listing area has rendered.
    fn content_selector(&self) -> &str;

    /// Listings on the current page, in page order. Empty means end of results.
    async fn find_listings(&self) -> anyhow::Result<Vec<Self::Listing>>;

    async fn extract_job(&self, listing: &Self::Listing) -> anyhow::Result<Extraction>;

    /// Best-effort modal dismissal.
    async fn handle_popup_if_present(&self) -> anyhow::Result<()>;

    /// `Ok(true)` when the next page was requested, `Ok(false)` when there is
    /// no further page.
    async fn go_to_next_page(&self) -> anyhow::Result<bool>;
}

// Field helpers shared by the chromiumoxide-backed adapters. Lookups that fail
// yield `None`; the caller decides whether the field is required.

pub(crate) async fn child_text(parent: &Element, selector: &str) -> Option<String> {
    let child = parent.find_element(selector).await.ok()?;
    let text = child.inner_text().await.ok()??;
    Some(text.trim().to_string())
}

/// Resolved `href` property of the first match, absolute even when the markup
/// carries a relative link.
pub(crate) async fn child_href(parent: &Element, selector: &str) -> Option<String> {
    let child = parent.find_element(selector).await.ok()?;
    element_href(&child).await
}

pub(crate) async fn element_href(element: &Element) -> Option<String> {
    js_string(element, "function() { return this.href || ''; }")
        .await
        .filter(|href| !href.is_empty())
}

/// Poll for `selector` on the page until it matches. Unbounded; callers wrap
/// it in [`with_page_timeout`](crate::crawl_engine::with_page_timeout).
pub async fn wait_for_element(page: &Page, selector: &str, poll: Duration) -> anyhow::Result<Element> {
    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Ok(element);
        }
        tokio::time::sleep(poll).await;
    }
}

/// Read a field whose selector may be unconfigured.
pub(crate) async fn read_optional<'a, F, Fut>(selector: &'a Option<String>, read: F) -> Option<String>
where
    F: FnOnce(&'a str) -> Fut,
    Fut: Future<Output = Option<String>>,
{
    match selector {
        Some(selector) => read(selector).await,
        None => None,
    }
}

/// Evaluate `function_decl` with `this` bound to `element` and return its
/// string result.
pub(crate) async fn js_string(element: &Element, function_decl: &str) -> Option<String> {
    let returns = element.call_js_fn(function_decl, false).await.ok()?;
    returns
        .result
        .value
        .and_then(|v| v.as_str().map(|s| s.trim().to_string()))
}

/// Text of the second child node, which is where both sites put the value
/// next to an icon.
pub(crate) async fn second_child_text(parent: &Element, selector: &str) -> Option<String> {
    let child = parent.find_element(selector).await.ok()?;
    js_string(
        &child,
        "function() { const n = this.childNodes[1]; return n ? n.textContent.trim() : ''; }",
    )
    .await
}

/// Full text content, including hidden descendants.
pub(crate) async fn text_content(parent: &Element, selector: &str) -> Option<String> {
    let child = parent.find_element(selector).await.ok()?;
    js_string(&child, "function() { return this.textContent || ''; }").await
}

/// Click through JS, bypassing overlays that intercept real clicks.
pub(crate) async fn js_click(element: &Element) -> anyhow::Result<()> {
    element
        .call_js_fn("function() { this.click(); }", false)
        .await?;
    Ok(())
}

/// Pager shared by both sites: locate the pager, pause, locate the next
/// control, pause, bring it into view, pause, click.
pub(crate) async fn click_next_page(
    page: &Page,
    pager_selector: &str,
    next_selector: &str,
    pacing: &Pacing,
) -> anyhow::Result<bool> {
    let Ok(pager) = page.find_element(pager_selector).await else {
        info!("No pager found");
        return Ok(false);
    };
    pacing.pause(pacing::BEFORE_NEXT_CONTROL).await;

    let Ok(next) = pager.find_element(next_selector).await else {
        info!("No next page button found");
        return Ok(false);
    };
    pacing.pause(pacing::BEFORE_SCROLL_INTO_VIEW).await;

    next.call_js_fn("function() { this.scrollIntoView(true); }", false)
        .await?;
    pacing.pause(pacing::BEFORE_NEXT_CLICK).await;

    js_click(&next).await?;
    debug!("Clicked next page control");
    Ok(true)
}
