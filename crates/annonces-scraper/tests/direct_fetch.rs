//! Integration tests for direct (HTTP) crawls.
//!
//! Uses `wiremock` to stand up a local listing site for each test so no real
//! network traffic is made. The built-in Coinafrique descriptor is cloned
//! and pointed at the mock server.

use std::env::VarError;

use annonces_core::{
    build_app_config, AppConfig, ContinuationPolicy, ErrorCause, FetchStrategy, FieldRole,
    SiteDescriptor, SiteId, SiteRegistry, UrlTemplate, DEFAULT_USER_AGENT,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use annonces_scraper::{crawl_site, HttpFetcher, PageFetcher, ScraperError};

/// Direct strategy, no retries, no backoff.
fn test_config() -> AppConfig {
    let mut config =
        build_app_config(|_| Err(VarError::NotPresent)).expect("defaults always parse");
    config.fetch_strategy = Some(FetchStrategy::Direct);
    config.request_timeout_secs = 5;
    config.user_agent = "annonces-test/0.1".to_owned();
    config.max_retries = 0;
    config.retry_backoff_base_secs = 0;
    config
}

/// The dogs category, served from `server`.
fn mock_site(server: &MockServer) -> SiteDescriptor {
    let mut site = SiteRegistry::builtin()
        .get(SiteId::CoinafriqueDogs)
        .expect("builtin site")
        .clone();
    site.origin = server.uri();
    site.url_template = UrlTemplate::new(format!("{}/categorie/chiens?page={{page}}", server.uri()))
        .expect("template has placeholder");
    site
}

fn card(name: &str, price: &str) -> String {
    format!(
        r#"<div class="col s6 m4 l3">
             <div class="card ad__card">
               <a class="card-image" href="/annonce/chiens/{name}">
                 <img class="ad__card-img" src="/media/{name}.jpg" alt="{name}">
               </a>
               <p class="ad__card-price">{price}</p>
               <p class="ad__card-description">{name}</p>
               <p class="ad__card-location"><span>Dakar, Sénégal</span></p>
             </div>
           </div>"#
    )
}

fn listing_page(cards: &[String]) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(format!(
            "<!DOCTYPE html><html><body><div class=\"row\">{}</div></body></html>",
            cards.concat()
        ))
}

async fn mount_page(server: &MockServer, page: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/categorie/chiens"))
        .and(query_param("page", page))
        .respond_with(response)
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn direct_crawl_extracts_every_page_in_order() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "1",
        listing_page(&[card("berger", "150 000 CFA"), card("caniche", "90 000 FCFA")]),
    )
    .await;
    mount_page(&server, "2", listing_page(&[card("boerboel", "300000 CFA")])).await;

    let site = mock_site(&server);
    let result = crawl_site(&site, 2, &test_config(), &CancellationToken::new())
        .await
        .expect("crawl should succeed");

    assert_eq!(result.pages_fetched, 2);
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    let names: Vec<_> = result
        .records
        .iter()
        .map(|r| r.get(FieldRole::PrimaryText).unwrap())
        .collect();
    assert_eq!(names, vec!["berger", "caniche", "boerboel"]);

    let first = &result.records[0];
    assert_eq!(first.get(FieldRole::Price), Some("150000"));
    assert_eq!(first.get(FieldRole::Location), Some("Dakar, Sénégal"));
    assert_eq!(
        first.get(FieldRole::Link),
        Some(format!("{}/media/berger.jpg", server.uri()).as_str())
    );
}

#[tokio::test]
async fn empty_listing_page_is_a_successful_empty_result() {
    let server = MockServer::start().await;
    mount_page(&server, "1", listing_page(&[])).await;

    let site = mock_site(&server);
    let result = crawl_site(&site, 1, &test_config(), &CancellationToken::new())
        .await
        .expect("crawl should succeed");

    assert!(result.is_empty());
    assert!(result.errors.is_empty());
}

// ---------------------------------------------------------------------------
// Page failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_page_is_recorded_and_crawl_continues() {
    let server = MockServer::start().await;
    mount_page(&server, "1", listing_page(&[card("berger", "1 CFA")])).await;
    mount_page(&server, "2", ResponseTemplate::new(404)).await;
    mount_page(&server, "3", listing_page(&[card("lévrier", "2 CFA")])).await;

    let site = mock_site(&server);
    let result = crawl_site(&site, 3, &test_config(), &CancellationToken::new())
        .await
        .expect("page failures are data, not errors");

    assert_eq!(result.records.len(), 2);
    assert_eq!(result.pages_fetched, 2);
    let page_errors: Vec<_> = result.page_errors().collect();
    assert_eq!(page_errors.len(), 1);
    assert_eq!(page_errors[0].context.page, 2);
    assert!(
        matches!(&page_errors[0].cause, ErrorCause::NetworkFailure { message } if message.contains("not found")),
        "got {:?}",
        page_errors[0].cause
    );
}

#[tokio::test]
async fn fail_fast_stops_requesting_after_a_server_error() {
    let server = MockServer::start().await;
    mount_page(&server, "1", ResponseTemplate::new(500)).await;
    Mock::given(method("GET"))
        .and(path("/categorie/chiens"))
        .and(query_param("page", "2"))
        .respond_with(listing_page(&[card("jamais", "1 CFA")]))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.continuation_policy = ContinuationPolicy::FailFast;
    let site = mock_site(&server);
    let result = crawl_site(&site, 2, &config, &CancellationToken::new())
        .await
        .expect("page failures are data, not errors");

    assert!(result.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.pages_fetched, 0);
}

#[tokio::test]
async fn server_error_is_retried_before_giving_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/categorie/chiens"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "1", listing_page(&[card("berger", "1 CFA")])).await;

    let mut config = test_config();
    config.max_retries = 2;
    let site = mock_site(&server);
    let result = crawl_site(&site, 1, &config, &CancellationToken::new())
        .await
        .expect("crawl should succeed");

    assert_eq!(result.records.len(), 1);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn invalid_page_count_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(listing_page(&[]))
        .expect(0)
        .mount(&server)
        .await;

    let site = mock_site(&server);
    let err = crawl_site(&site, 0, &test_config(), &CancellationToken::new())
        .await
        .expect_err("zero pages must be rejected");
    assert!(matches!(err, ScraperError::Config(_)));
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

#[tokio::test]
async fn forbidden_is_retried_with_browser_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header_regex("user-agent", "^Mozilla/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let mut fetcher = HttpFetcher::new(5, "annonces-test/0.1", 0, 0).expect("client builds");
    let body = fetcher
        .fetch(&format!("{}/categorie/chiens?page=1", server.uri()))
        .await
        .expect("fallback user-agent should be accepted");
    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn default_user_agent_falls_back_to_browser_on_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header_regex("user-agent", "^annonces/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header_regex("user-agent", "^Mozilla/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let config = build_app_config(|_| Err(VarError::NotPresent)).expect("defaults always parse");
    assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    let mut fetcher = HttpFetcher::new(5, &config.user_agent, 0, 0).expect("client builds");
    let body = fetcher
        .fetch(&format!("{}/categorie/moutons?page=1", server.uri()))
        .await
        .expect("browser user-agent should be accepted");
    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn rate_limit_surfaces_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let mut fetcher = HttpFetcher::new(5, "annonces-test/0.1", 0, 0).expect("client builds");
    let err = fetcher
        .fetch(&format!("{}/categorie/moutons?page=1", server.uri()))
        .await
        .expect_err("429 must fail without retries");
    assert!(
        matches!(err, ScraperError::RateLimited { retry_after_secs: 30, .. }),
        "got {err:?}"
    );
}
