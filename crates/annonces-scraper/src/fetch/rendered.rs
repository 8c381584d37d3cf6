//! Rendered fetch: pages are loaded in one headless Chromium tab that lives
//! for the whole crawl.

use std::time::Duration;

use annonces_core::{AppConfig, BROWSER_USER_AGENT, DEFAULT_USER_AGENT};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::PageFetcher;
use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

/// Launch and navigation settings for the browser session.
#[derive(Debug, Clone)]
pub struct RenderedSettings {
    /// Connect to this DevTools endpoint instead of launching a browser.
    pub remote_url: Option<String>,
    pub executable: Option<String>,
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Wait after navigation completes before reading the DOM.
    pub settle: Duration,
    pub max_retries: u32,
    pub backoff_base_secs: u64,
}

impl RenderedSettings {
    /// Headless Chrome keeps a browser identity unless `ANNONCES_USER_AGENT`
    /// names a different one.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let user_agent = if config.user_agent == DEFAULT_USER_AGENT {
            BROWSER_USER_AGENT.to_owned()
        } else {
            config.user_agent.clone()
        };
        Self {
            remote_url: config.chrome_remote_url.clone(),
            executable: config.chrome_executable.clone(),
            user_agent,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            settle: Duration::from_millis(config.page_settle_ms),
            max_retries: config.max_retries,
            backoff_base_secs: config.retry_backoff_base_secs,
        }
    }
}

struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

/// Fetcher backed by a single browser tab.
///
/// The session is acquired by [`RenderedFetcher::launch`] and released by
/// [`PageFetcher::release`]. Dropping an unreleased fetcher stops the CDP
/// event loop and lets `chromiumoxide` kill the child process.
pub struct RenderedFetcher {
    session: Option<BrowserSession>,
    settings: RenderedSettings,
}

impl RenderedFetcher {
    /// Launches (or connects to) Chromium and opens the tab used for every page.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if the browser cannot be started,
    /// reached, or configured.
    pub async fn launch(settings: RenderedSettings) -> Result<Self, ScraperError> {
        let (browser, mut handler) = if let Some(url) = &settings.remote_url {
            tracing::info!(url = %url, "connecting to remote Chrome instance");
            Browser::connect(url).await?
        } else {
            let mut builder = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(settings.request_timeout)
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .arg("--disable-extensions");
            if let Some(path) = &settings.executable {
                builder = builder.chrome_executable(path);
            }
            let config = builder.build().map_err(ScraperError::Browser)?;
            tracing::info!("launching headless Chrome");
            Browser::launch(config).await?
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                handler.abort();
                return Err(err.into());
            }
        };
        page.set_user_agent(settings.user_agent.as_str()).await?;

        Ok(Self {
            session: Some(BrowserSession {
                browser,
                page,
                handler,
            }),
            settings,
        })
    }

    async fn load(page: &Page, url: &str, settle: Duration) -> Result<String, ScraperError> {
        // `goto` resolves once the load event has fired.
        page.goto(url)
            .await
            .map_err(|err| ScraperError::Navigation {
                url: url.to_owned(),
                reason: err.to_string(),
            })?;
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
        Ok(page.content().await?)
    }
}

#[async_trait]
impl PageFetcher for RenderedFetcher {
    async fn fetch(&mut self, url: &str) -> Result<String, ScraperError> {
        let Some(session) = self.session.as_ref() else {
            return Err(ScraperError::Browser(
                "browser session already released".to_owned(),
            ));
        };
        let settle = self.settings.settle;
        retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_secs,
            || Self::load(&session.page, url, settle),
        )
        .await
    }

    async fn release(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if let Err(err) = session.page.close().await {
            tracing::debug!(error = %err, "closing browser tab failed");
        }
        if self.settings.remote_url.is_none() {
            if let Err(err) = session.browser.close().await {
                tracing::warn!(error = %err, "closing browser failed");
            }
            if let Err(err) = session.browser.wait().await {
                tracing::warn!(error = %err, "waiting for browser exit failed");
            }
        }
        session.handler.abort();
        tracing::info!("browser session released");
    }
}

impl Drop for RenderedFetcher {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::warn!("browser session dropped without release");
            session.handler.abort();
        }
    }
}
