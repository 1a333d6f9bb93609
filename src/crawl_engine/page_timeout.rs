//! Timeout utilities for page operations
//!
//! Every navigation and DOM wait in the crawl loop goes through here so none
//! of them can hang the worker.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Run `operation` under a timeout of `timeout_secs`.
///
/// # Returns
/// * `Ok(T)` - Operation completed successfully
/// * `Err` - Either the operation failed or the timeout was reached
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout_secs: u64,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {timeout_secs} seconds"
        )),
    }
}
