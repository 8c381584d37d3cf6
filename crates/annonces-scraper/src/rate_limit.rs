//! Bounded retry with exponential backoff for page fetches.
//!
//! Transient failures (429, 5xx, transport errors, browser navigation
//! errors) are retried. Anything that would fail the same way again is
//! returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Returns `true` if `err` is worth another attempt after a backoff delay.
///
/// Retriable:
/// - [`ScraperError::RateLimited`]: HTTP 429.
/// - [`ScraperError::Http`]: connection reset, timeout, DNS hiccup.
/// - [`ScraperError::UnexpectedStatus`] with a 5xx status.
/// - [`ScraperError::Navigation`]: the browser failed to load the page.
///
/// Everything else (404, other 4xx, selector/config errors, a dead browser
/// session) is returned immediately.
fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. }
        | ScraperError::Http(_)
        | ScraperError::Navigation { .. } => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Seconds to wait before retry number `attempt + 1`.
///
/// Exponential in `attempt`, but never shorter than the `Retry-After` a
/// rate-limiting server asked for.
fn backoff_delay_secs(err: &ScraperError, attempt: u32, backoff_base_secs: u64) -> u64 {
    let exponential = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
    match err {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => exponential.max(*retry_after_secs),
        _ => exponential,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// On a retriable error the function sleeps `backoff_base_secs * 2^attempt`
/// seconds (or the server's `Retry-After`, if longer) and tries again, up to
/// `max_retries` additional attempts after the first try. When retries run
/// out the last error is returned.
///
/// With `max_retries = 2` and `backoff_base_secs = 1` the operation runs at
/// most 3 times, sleeping 1 s then 2 s between attempts.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay_secs = backoff_delay_secs(&err, attempt, backoff_base_secs);
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient fetch error; retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
