//! Sequential crawl of a source's listing pages.
//!
//! Pages `1..=N` are fetched one at a time through a [`PageFetcher`]; each
//! page is fully extracted before the next fetch starts, so records come
//! back in page order and then document order.

use std::time::Duration;

use annonces_core::{
    AppConfig, ContinuationPolicy, CrawlResult, ExtractionError, FieldFailurePolicy,
    SiteDescriptor, SiteRegistry,
};
use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;
use crate::extract::extract_page;
use crate::fetch::{open_fetcher, PageFetcher};
use crate::pagination::{page_urls, validate_page_count};
use crate::parse::CompiledSite;

/// Per-crawl behaviour knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlOptions {
    pub continuation: ContinuationPolicy,
    pub field_policy: FieldFailurePolicy,
    /// Pause between consecutive pages. Never applied before page 1.
    pub inter_page_delay: Duration,
}

impl CrawlOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            continuation: config.continuation_policy,
            field_policy: config.field_policy,
            inter_page_delay: Duration::from_millis(config.inter_request_delay_ms),
        }
    }
}

/// A caller's request: which source, how many pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Display name or slug of a registered source.
    pub source: String,
    pub page_count: u32,
}

/// A validated, ready-to-run crawl of one source.
///
/// [`Crawl::run`] consumes the crawl; a finished crawl cannot be restarted.
pub struct Crawl<'s> {
    site: CompiledSite<'s>,
    page_count: u32,
    options: CrawlOptions,
}

impl<'s> Crawl<'s> {
    /// Validates the page count and compiles the source's selectors.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Config`] for a page count outside
    /// `1..=MAX_PAGES`, or [`ScraperError::InvalidSelector`] if the source
    /// carries a selector that does not parse.
    pub fn new(
        site: &'s SiteDescriptor,
        page_count: u32,
        options: CrawlOptions,
    ) -> Result<Self, ScraperError> {
        let page_count = validate_page_count(page_count)?;
        Ok(Self {
            site: CompiledSite::compile(site)?,
            page_count,
            options,
        })
    }

    /// Fetches and extracts every page, then always releases `fetcher`.
    pub async fn execute(
        self,
        mut fetcher: Box<dyn PageFetcher>,
        cancel: &CancellationToken,
    ) -> CrawlResult {
        let result = self.run(fetcher.as_mut(), cancel).await;
        fetcher.release().await;
        result
    }

    /// Fetches and extracts every page with `fetcher`.
    ///
    /// Page fetch failures are recorded as page-level errors and then handled
    /// by the configured [`ContinuationPolicy`]. Cancellation is observed
    /// between pages, including during the inter-page delay.
    pub async fn run(
        self,
        fetcher: &mut dyn PageFetcher,
        cancel: &CancellationToken,
    ) -> CrawlResult {
        let site = self.site.site();
        let mut result = CrawlResult::new(site.name, site.columns(), self.page_count);

        for (page, url) in page_urls(site, self.page_count) {
            if cancel.is_cancelled() {
                result.cancelled = true;
                break;
            }
            let delay = self.options.inter_page_delay;
            if page > 1 && !delay.is_zero() {
                tokio::select! {
                    () = cancel.cancelled() => {
                        result.cancelled = true;
                        break;
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }

            match fetcher.fetch(&url).await {
                Ok(html) => {
                    result.pages_fetched += 1;
                    let extracted =
                        extract_page(&self.site, &html, page, self.options.field_policy);
                    tracing::info!(
                        source = site.slug,
                        page,
                        url = %url,
                        containers = extracted.containers,
                        records = extracted.records.len(),
                        errors = extracted.errors.len(),
                        "page extracted"
                    );
                    result.records.extend(extracted.records);
                    result.errors.extend(extracted.errors);
                }
                Err(err) => {
                    tracing::warn!(
                        source = site.slug,
                        page,
                        url = %url,
                        error = %err,
                        "page fetch failed"
                    );
                    result.errors.push(ExtractionError::network(page, err.to_string()));
                    if self.options.continuation == ContinuationPolicy::FailFast {
                        tracing::warn!(
                            source = site.slug,
                            page,
                            remaining = self.page_count - page,
                            "fail-fast: skipping remaining pages"
                        );
                        break;
                    }
                }
            }
        }

        if result.cancelled {
            tracing::info!(
                source = site.slug,
                pages_fetched = result.pages_fetched,
                "crawl cancelled"
            );
        }
        result.finish();
        result
    }
}

/// Resolves `request.source` in the built-in registry and crawls it.
///
/// # Errors
///
/// Returns [`ScraperError::Config`] for an unknown source or invalid page
/// count, before any session is opened, and [`ScraperError`] if the fetch
/// session cannot be opened.
pub async fn crawl(
    request: &CrawlRequest,
    config: &AppConfig,
    cancel: &CancellationToken,
) -> Result<CrawlResult, ScraperError> {
    let site = SiteRegistry::builtin().resolve(&request.source)?;
    crawl_site(site, request.page_count, config, cancel).await
}

/// Crawls `site`, opening a fetcher for the configured strategy (or the
/// site's default) and releasing it on every exit path.
///
/// # Errors
///
/// See [`crawl`].
pub async fn crawl_site(
    site: &SiteDescriptor,
    page_count: u32,
    config: &AppConfig,
    cancel: &CancellationToken,
) -> Result<CrawlResult, ScraperError> {
    let crawl = Crawl::new(site, page_count, CrawlOptions::from_config(config))?;
    let strategy = config.fetch_strategy.unwrap_or(site.strategy);
    tracing::info!(source = site.slug, pages = page_count, strategy = %strategy, "starting crawl");

    let fetcher = open_fetcher(strategy, config).await?;
    let result = crawl.execute(fetcher, cancel).await;

    tracing::info!(
        source = site.slug,
        pages_fetched = result.pages_fetched,
        records = result.records.len(),
        errors = result.errors.len(),
        "crawl finished"
    );
    Ok(result)
}

#[cfg(test)]
#[path = "crawl_test.rs"]
mod tests;
