use std::str::FromStr;

use crate::ConfigError;

/// How a page's markup is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Load the page in a headless browser session and read the rendered DOM.
    Rendered,
    /// Plain HTTP GET; no script execution.
    Direct,
}

impl FromStr for FetchStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rendered" | "browser" => Ok(Self::Rendered),
            "direct" | "http" => Ok(Self::Direct),
            _ => Err(ConfigError::InvalidValue {
                kind: "fetch strategy",
                value: s.to_owned(),
                expected: "rendered, direct",
            }),
        }
    }
}

impl std::fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStrategy::Rendered => write!(f, "rendered"),
            FetchStrategy::Direct => write!(f, "direct"),
        }
    }
}

/// What the crawl does after a page fails to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContinuationPolicy {
    /// Stop at the first failed page and return what was collected so far.
    FailFast,
    /// Record the failure, skip the page, and move on to the next one.
    #[default]
    BestEffort,
}

impl FromStr for ContinuationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "fail_fast" => Ok(Self::FailFast),
            "best-effort" | "best_effort" => Ok(Self::BestEffort),
            _ => Err(ConfigError::InvalidValue {
                kind: "continuation policy",
                value: s.to_owned(),
                expected: "fail-fast, best-effort",
            }),
        }
    }
}

/// What the extractor does with a listing when one of its fields cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldFailurePolicy {
    /// Leave the field absent and keep the rest of the record.
    #[default]
    Partial,
    /// Drop the whole record and report a single error for it.
    DiscardRecord,
}

impl FromStr for FieldFailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "partial" => Ok(Self::Partial),
            "discard" | "discard-record" => Ok(Self::DiscardRecord),
            _ => Err(ConfigError::InvalidValue {
                kind: "field failure policy",
                value: s.to_owned(),
                expected: "partial, discard",
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub continuation_policy: ContinuationPolicy,
    pub field_policy: FieldFailurePolicy,
    /// Overrides every site's default strategy when set.
    pub fetch_strategy: Option<FetchStrategy>,
    /// DevTools websocket/HTTP endpoint of an already running Chrome.
    pub chrome_remote_url: Option<String>,
    pub chrome_executable: Option<String>,
    /// Extra wait after navigation before the rendered DOM is read.
    pub page_settle_ms: u64,
}
