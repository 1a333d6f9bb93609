//! Browser session owned by one worker run
//!
//! `acquire()` cleans stale profiles, launches a hardened browser against a
//! fresh profile, opens a blank page and registers the stealth scripts on it.
//! `release()` tears all of that down and is safe to call more than once;
//! `Drop` runs the synchronous part of the same teardown if it never ran.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::browser_profile::{cleanup_stale_profiles, create_unique_profile};
use crate::browser_setup::launch_browser;
use crate::crawl_engine::cleanup::{self, CleanupResult};
use crate::crawl_engine::PageDriver;
use crate::kromekover;
use crate::sites::wait_for_element;

/// Upper bound on the graceful close before falling back to force-kill.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct BrowserSession {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    page: Option<Page>,
    profile_dir: Option<PathBuf>,
    released: bool,
}

impl BrowserSession {
    pub async fn acquire(headless: bool) -> Result<Self> {
        match cleanup_stale_profiles() {
            Ok(0) => {}
            Ok(n) => info!("Removed {n} stale browser profiles"),
            Err(e) => warn!("Stale profile cleanup failed: {e:#}"),
        }

        let profile = create_unique_profile()?;
        let (browser, handler) = launch_browser(headless, profile.path()).await?;

        let mut session = Self {
            browser: Some(browser),
            handler: Some(handler),
            page: None,
            profile_dir: Some(profile.into_path()),
            released: false,
        };

        let page = match session.open_blank_page().await {
            Ok(page) => page,
            Err(e) => {
                session.release().await;
                return Err(e);
            }
        };

        // Non-fatal
        if let Err(e) = kromekover::inject(&page).await {
            warn!("Stealth script injection failed: {e:#}");
        }

        session.page = Some(page);
        info!("Browser session ready");
        Ok(session)
    }

    async fn open_blank_page(&self) -> Result<Page> {
        let browser = self
            .browser
            .as_ref()
            .context("Browser session already released")?;
        browser
            .new_page("about:blank")
            .await
            .context("Failed to create blank page")
    }

    /// The session's page. Clones share the same CDP target.
    pub fn page(&self) -> Result<Page> {
        self.page
            .clone()
            .context("Browser session has no page")
    }

    #[must_use]
    pub fn profile_dir(&self) -> Option<&Path> {
        self.profile_dir.as_deref()
    }

    /// Close the browser, kill orphaned automation browsers, remove the
    /// profile. Later calls are no-ops.
    pub async fn release(&mut self) -> CleanupResult {
        if self.released {
            return CleanupResult::Success;
        }
        self.released = true;
        info!("Releasing browser session");

        let mut errors = Vec::new();
        self.page = None;

        if let Some(mut browser) = self.browser.take() {
            let handler = self.handler.take();
            match tokio::time::timeout(CLOSE_TIMEOUT, async {
                match handler {
                    Some(handler) => cleanup::close_browser(&mut browser, handler).await,
                    None => CleanupResult::Success,
                }
            })
            .await
            {
                Ok(CleanupResult::PartialFailure(mut e)) => errors.append(&mut e),
                Ok(CleanupResult::Success) => {}
                Err(_) => errors.push(format!(
                    "Browser close timed out after {}s",
                    CLOSE_TIMEOUT.as_secs()
                )),
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        self.force_teardown(&mut errors);

        if errors.is_empty() {
            CleanupResult::Success
        } else {
            warn!("Browser session released with errors: {errors:?}");
            CleanupResult::PartialFailure(errors)
        }
    }

    fn force_teardown(&mut self, errors: &mut Vec<String>) {
        let killed = cleanup::kill_orphaned_browsers(self.profile_dir.as_deref());
        if killed > 0 {
            info!("Killed {killed} lingering browser processes");
        }
        if let Some(dir) = self.profile_dir.take()
            && let CleanupResult::PartialFailure(mut e) = cleanup::remove_profile_dir(&dir)
        {
            errors.append(&mut e);
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        warn!("BrowserSession dropped without release - forcing teardown");
        self.released = true;
        self.page = None;
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        // Dropping the Browser kills its child process
        self.browser = None;
        let mut errors = Vec::new();
        self.force_teardown(&mut errors);
    }
}

/// [`PageDriver`] over a chromiumoxide page.
#[derive(Clone)]
pub struct BrowserPage {
    page: Page,
}

impl BrowserPage {
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self { page }
    }
}

#[async_trait]
impl PageDriver for BrowserPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, poll: Duration) -> Result<()> {
        wait_for_element(&self.page, selector, poll).await?;
        Ok(())
    }

    async fn scroll_by(&self, dy: i64) -> Result<()> {
        self.page
            .evaluate(format!("window.scrollBy(0, {dy})"))
            .await?;
        Ok(())
    }
}
