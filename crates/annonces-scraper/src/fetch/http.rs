//! Direct fetch: a plain GET, no script execution.

use std::time::Duration;

use annonces_core::BROWSER_USER_AGENT;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::PageFetcher;
use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

/// HTTP fetcher for listing pages.
///
/// 404 and other non-2xx responses come back as typed errors. A 403 is
/// retried once with a browser user-agent before giving up, since listing
/// sites commonly gate bot user-agents. Transient errors (429, 5xx,
/// network failures) are retried with exponential backoff up to
/// `max_retries` additional attempts.
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl HttpFetcher {
    /// Creates an `HttpFetcher` with configured timeout, `User-Agent`, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            user_agent: user_agent.to_owned(),
            max_retries,
            backoff_base_secs,
        })
    }

    async fn get_once(&self, url: &str, user_agent: &str) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "fr-FR,fr;q=0.9,en;q=0.8")
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScraperError::RateLimited {
                domain: extract_domain(url),
                retry_after_secs,
            });
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.text().await?)
    }

    async fn get_with_fallback(&self, url: &str) -> Result<String, ScraperError> {
        match self.get_once(url, &self.user_agent).await {
            Err(ScraperError::UnexpectedStatus { status: 403, .. })
                if self.user_agent != BROWSER_USER_AGENT =>
            {
                tracing::debug!(url, "403 with configured user-agent; retrying as browser");
                self.get_once(url, BROWSER_USER_AGENT).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&mut self, url: &str) -> Result<String, ScraperError> {
        let this = &*self;
        retry_with_backoff(this.max_retries, this.backoff_base_secs, || {
            this.get_with_fallback(url)
        })
        .await
    }
}

/// Extracts the hostname from a URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}
