pub mod app_config;
pub mod config;
pub mod records;
pub mod sites;

pub use app_config::{AppConfig, ContinuationPolicy, FetchStrategy, FieldFailurePolicy};
pub use config::{
    build_app_config, load_app_config, load_app_config_from_env, BROWSER_USER_AGENT,
    DEFAULT_USER_AGENT,
};
pub use records::{
    CrawlResult, ErrorCause, ErrorContext, ExtractedRecord, ExtractionError, FieldRole,
};
pub use sites::{
    FieldSpec, Locator, PathStep, SiteDescriptor, SiteId, SiteRegistry, UrlTemplate,
};

use thiserror::Error;

/// Largest page count a single crawl may request.
pub const MAX_PAGES: u32 = 70;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid {kind} \"{value}\"; expected one of: {expected}")]
    InvalidValue {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("unknown source \"{name}\"; run `annonces-cli sources` to list registered sources")]
    UnknownSource { name: String },

    #[error("page count must be between 1 and {max}, got {requested}")]
    InvalidPageCount { requested: u32, max: u32 },
}
