//! Human-like timing between browser actions
//!
//! Every delay is a bounded uniform range. `Pacing::none()` turns all of them
//! into no-ops for tests and dry runs; the scroll plan is still produced so
//! callers exercise the same path.

use std::time::Duration;

use rand::Rng;

/// A uniformly sampled delay in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delay {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Delay {
    #[must_use]
    pub const fn between(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    #[must_use]
    pub const fn fixed(secs: f64) -> Self {
        Self::between(secs, secs)
    }

    #[must_use]
    pub fn sample(&self) -> Duration {
        let secs = if self.max_secs > self.min_secs {
            rand::rng().random_range(self.min_secs..=self.max_secs)
        } else {
            self.min_secs
        };
        Duration::from_secs_f64(secs.max(0.0))
    }
}

// Crawl loop
pub const SETTLE_AFTER_WAIT: Delay = Delay::between(1.0, 3.0);
pub const BEFORE_SCROLL: Delay = Delay::between(2.0, 4.0);
pub const BETWEEN_SCROLL_STEPS: Delay = Delay::between(0.5, 1.5);
pub const AFTER_SCROLL: Delay = Delay::between(2.0, 4.0);
pub const HOVER: Delay = Delay::between(0.3, 0.7);
pub const AFTER_PAGE_CHANGE: Delay = Delay::between(1.5, 3.5);

// Pagination
pub const BEFORE_NEXT_CONTROL: Delay = Delay::between(3.0, 6.0);
pub const BEFORE_SCROLL_INTO_VIEW: Delay = Delay::between(0.2, 0.5);
pub const BEFORE_NEXT_CLICK: Delay = Delay::fixed(0.5);

// Site interactions
pub const AFTER_POPUP_CLOSE: Delay = Delay::between(1.0, 2.0);
pub const BEFORE_LISTING_CLICK: Delay = Delay::between(0.3, 0.5);
pub const PANEL_SETTLE: Delay = Delay::between(0.5, 1.0);

/// Scroll plan: 2 to 5 steps of 100 to 400 pixels.
const SCROLL_STEPS: (u32, u32) = (2, 5);
const SCROLL_STEP_PX: (i64, i64) = (100, 400);

#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    enabled: bool,
}

impl Pacing {
    #[must_use]
    pub const fn human() -> Self {
        Self { enabled: true }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self { enabled: false }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn pause(&self, delay: Delay) {
        if !self.enabled {
            return;
        }
        let duration = delay.sample();
        tokio::time::sleep(duration).await;
    }

    /// Pixel offsets for one human-like scroll.
    #[must_use]
    pub fn scroll_plan(&self) -> Vec<i64> {
        let mut rng = rand::rng();
        let steps = rng.random_range(SCROLL_STEPS.0..=SCROLL_STEPS.1);
        (0..steps)
            .map(|_| rng.random_range(SCROLL_STEP_PX.0..=SCROLL_STEP_PX.1))
            .collect()
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::human()
    }
}
