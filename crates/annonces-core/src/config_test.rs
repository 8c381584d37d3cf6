use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(cfg.inter_request_delay_ms, 0);
    assert_eq!(cfg.max_retries, 2);
    assert_eq!(cfg.retry_backoff_base_secs, 1);
    assert_eq!(cfg.continuation_policy, ContinuationPolicy::BestEffort);
    assert_eq!(cfg.field_policy, FieldFailurePolicy::Partial);
    assert!(cfg.fetch_strategy.is_none());
    assert!(cfg.chrome_remote_url.is_none());
    assert!(cfg.chrome_executable.is_none());
    assert_eq!(cfg.page_settle_ms, 0);
}

#[test]
fn default_user_agent_is_not_the_browser_fallback() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_ne!(cfg.user_agent, BROWSER_USER_AGENT);
    assert!(cfg.user_agent.starts_with("annonces/"));
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("ANNONCES_REQUEST_TIMEOUT_SECS", "10");
    map.insert("ANNONCES_MAX_RETRIES", "5");
    map.insert("ANNONCES_CONTINUATION_POLICY", "fail-fast");
    map.insert("ANNONCES_FIELD_POLICY", "discard");
    map.insert("ANNONCES_FETCH_STRATEGY", "direct");
    map.insert("ANNONCES_CHROME_REMOTE_URL", "http://127.0.0.1:9222");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_timeout_secs, 10);
    assert_eq!(cfg.max_retries, 5);
    assert_eq!(cfg.continuation_policy, ContinuationPolicy::FailFast);
    assert_eq!(cfg.field_policy, FieldFailurePolicy::DiscardRecord);
    assert_eq!(cfg.fetch_strategy, Some(FetchStrategy::Direct));
    assert_eq!(
        cfg.chrome_remote_url.as_deref(),
        Some("http://127.0.0.1:9222")
    );
}

#[test]
fn blank_fetch_strategy_means_site_default() {
    let mut map = HashMap::new();
    map.insert("ANNONCES_FETCH_STRATEGY", "  ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.fetch_strategy.is_none());
}

#[test]
fn build_app_config_fails_with_invalid_timeout() {
    let mut map = HashMap::new();
    map.insert("ANNONCES_REQUEST_TIMEOUT_SECS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ANNONCES_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(ANNONCES_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_with_invalid_max_retries() {
    let mut map = HashMap::new();
    map.insert("ANNONCES_MAX_RETRIES", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ANNONCES_MAX_RETRIES"),
        "expected InvalidEnvVar(ANNONCES_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_with_unknown_policy() {
    let mut map = HashMap::new();
    map.insert("ANNONCES_CONTINUATION_POLICY", "sometimes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ANNONCES_CONTINUATION_POLICY"),
        "expected InvalidEnvVar(ANNONCES_CONTINUATION_POLICY), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_with_unknown_strategy() {
    let mut map = HashMap::new();
    map.insert("ANNONCES_FETCH_STRATEGY", "carrier-pigeon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ANNONCES_FETCH_STRATEGY"),
        "expected InvalidEnvVar(ANNONCES_FETCH_STRATEGY), got: {result:?}"
    );
}

#[test]
fn policy_parsing_accepts_both_separators() {
    assert_eq!(
        "best_effort".parse::<ContinuationPolicy>().unwrap(),
        ContinuationPolicy::BestEffort
    );
    assert_eq!(
        "Fail-Fast".parse::<ContinuationPolicy>().unwrap(),
        ContinuationPolicy::FailFast
    );
    assert_eq!(
        "browser".parse::<FetchStrategy>().unwrap(),
        FetchStrategy::Rendered
    );
}
