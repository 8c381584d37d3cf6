//! Page retrieval behind one contract, with a direct-HTTP and a
//! browser-rendered implementation.

mod http;
mod rendered;

use annonces_core::{AppConfig, FetchStrategy};
use async_trait::async_trait;

use crate::error::ScraperError;

pub use http::HttpFetcher;
pub use rendered::{RenderedFetcher, RenderedSettings};

/// Retrieves the markup of one page.
///
/// Implementations may hold a session (browser tab, connection pool) that is
/// reused across calls; [`PageFetcher::release`] tears it down.
#[async_trait]
pub trait PageFetcher: Send {
    /// Returns the page's HTML.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] when the page cannot be retrieved after retries.
    async fn fetch(&mut self, url: &str) -> Result<String, ScraperError>;

    /// Releases any session held by the fetcher. Calling it twice is a no-op.
    async fn release(&mut self) {}
}

/// Opens the fetcher for `strategy`, acquiring its session.
///
/// # Errors
///
/// Returns [`ScraperError`] if the HTTP client cannot be built or the browser
/// cannot be launched or reached.
pub async fn open_fetcher(
    strategy: FetchStrategy,
    config: &AppConfig,
) -> Result<Box<dyn PageFetcher>, ScraperError> {
    match strategy {
        FetchStrategy::Direct => Ok(Box::new(HttpFetcher::new(
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_secs,
        )?)),
        FetchStrategy::Rendered => {
            let settings = RenderedSettings::from_config(config);
            Ok(Box::new(RenderedFetcher::launch(settings).await?))
        }
    }
}
