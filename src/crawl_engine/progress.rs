//! Status reporting abstraction for crawl runs
//!
//! The worker reports through the status file; tests and embedded callers can
//! plug in anything else.

use crate::ipc::RunState;

/// Receives every status transition of a run.
pub trait StatusReporter: Send + Sync {
    fn report(&self, state: RunState, message: &str, jobs_scraped: u32, current_page: u32);
}

/// Status reporter that does nothing
#[derive(Debug, Clone, Copy)]
pub struct NoOpStatus;

impl StatusReporter for NoOpStatus {
    #[inline(always)]
    fn report(&self, _state: RunState, _message: &str, _jobs_scraped: u32, _current_page: u32) {}
}

impl<R: StatusReporter + ?Sized> StatusReporter for &R {
    fn report(&self, state: RunState, message: &str, jobs_scraped: u32, current_page: u32) {
        (**self).report(state, message, jobs_scraped, current_page);
    }
}
