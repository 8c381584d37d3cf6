use crate::app_config::{AppConfig, ContinuationPolicy, FetchStrategy, FieldFailurePolicy};
use crate::ConfigError;

/// Sent with every direct request unless `ANNONCES_USER_AGENT` overrides it.
pub const DEFAULT_USER_AGENT: &str = "annonces/0.1 (listing-crawler)";

/// Desktop Chrome identity, used once when a site answers 403 to the
/// configured user-agent.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to a value that cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to a value that cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every setting has a default, so an empty environment yields a usable config.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to a value that cannot be parsed.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let log_level = or_default("ANNONCES_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("ANNONCES_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("ANNONCES_USER_AGENT", DEFAULT_USER_AGENT);
    let inter_request_delay_ms = parse_u64("ANNONCES_INTER_REQUEST_DELAY_MS", "0")?;
    let max_retries = parse_u32("ANNONCES_MAX_RETRIES", "2")?;
    let retry_backoff_base_secs = parse_u64("ANNONCES_RETRY_BACKOFF_BASE_SECS", "1")?;

    let continuation_policy = or_default("ANNONCES_CONTINUATION_POLICY", "best-effort")
        .parse::<ContinuationPolicy>()
        .map_err(|e: ConfigError| invalid("ANNONCES_CONTINUATION_POLICY", e.to_string()))?;
    let field_policy = or_default("ANNONCES_FIELD_POLICY", "partial")
        .parse::<FieldFailurePolicy>()
        .map_err(|e: ConfigError| invalid("ANNONCES_FIELD_POLICY", e.to_string()))?;
    let fetch_strategy = lookup("ANNONCES_FETCH_STRATEGY")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<FetchStrategy>())
        .transpose()
        .map_err(|e: ConfigError| invalid("ANNONCES_FETCH_STRATEGY", e.to_string()))?;

    let chrome_remote_url = lookup("ANNONCES_CHROME_REMOTE_URL").ok();
    let chrome_executable = lookup("ANNONCES_CHROME_EXECUTABLE").ok();
    let page_settle_ms = parse_u64("ANNONCES_PAGE_SETTLE_MS", "0")?;

    Ok(AppConfig {
        log_level,
        request_timeout_secs,
        user_agent,
        inter_request_delay_ms,
        max_retries,
        retry_backoff_base_secs,
        continuation_policy,
        field_policy,
        fetch_strategy,
        chrome_remote_url,
        chrome_executable,
        page_settle_ms,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
