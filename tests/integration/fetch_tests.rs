//! Integration tests for page fetching and pagination resolution

use crate::common::{create_test_config, listing_page};
use reel_harvest::crawler::{FetchError, PageFetcher, PaginationResolver};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_for(server: &MockServer) -> (PageFetcher, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), dir.path());
    let fetcher = PageFetcher::from_config(&config).expect("Failed to build fetcher");
    (fetcher, dir)
}

#[tokio::test]
async fn test_fetch_returns_body_on_200() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alice/films/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>films</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (fetcher, _dir) = fetcher_for(&mock_server);
    let body = fetcher
        .fetch(&format!("{}/alice/films/", mock_server.uri()))
        .await
        .expect("Fetch should succeed");

    assert_eq!(body, "<html>films</html>");
}

#[tokio::test]
async fn test_fetch_404_is_fatal_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ghost/films/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (fetcher, _dir) = fetcher_for(&mock_server);
    let result = fetcher
        .fetch(&format!("{}/ghost/films/", mock_server.uri()))
        .await;

    match result {
        Err(FetchError::FatalStatus { status, .. }) => assert_eq!(status, 404),
        other => panic!("Expected FatalStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_recovers_after_rate_limit() {
    let mock_server = MockServer::start().await;

    // First request is rate limited, later ones succeed
    Mock::given(method("GET"))
        .and(path("/alice/films/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/alice/films/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (fetcher, _dir) = fetcher_for(&mock_server);
    let body = fetcher
        .fetch(&format!("{}/alice/films/", mock_server.uri()))
        .await
        .expect("Fetch should succeed after backing off");

    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_fetch_gives_up_after_max_attempts() {
    let mock_server = MockServer::start().await;

    // Test config allows 3 attempts
    Mock::given(method("GET"))
        .and(path("/busy/films/"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&mock_server)
        .await;

    let (fetcher, _dir) = fetcher_for(&mock_server);
    let result = fetcher
        .fetch(&format!("{}/busy/films/", mock_server.uri()))
        .await;

    match result {
        Err(FetchError::RateLimitExhausted { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("Expected RateLimitExhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_fatal_by_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alice/films/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (fetcher, _dir) = fetcher_for(&mock_server);
    let result = fetcher
        .fetch(&format!("{}/alice/films/", mock_server.uri()))
        .await;

    assert!(matches!(
        result,
        Err(FetchError::FatalStatus { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_server_error_retried_when_enabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alice/films/"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/alice/films/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(&mock_server.uri(), dir.path());
    config.fetch.retry_server_errors = true;
    let fetcher = PageFetcher::from_config(&config).expect("Failed to build fetcher");

    let body = fetcher
        .fetch(&format!("{}/alice/films/", mock_server.uri()))
        .await
        .expect("Fetch should succeed once the server recovers");
    assert_eq!(body, "recovered");
}

#[tokio::test]
async fn test_network_error_is_not_retried() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config("http://127.0.0.1:1", dir.path());
    let fetcher = PageFetcher::from_config(&config).expect("Failed to build fetcher");

    let result = fetcher.fetch("http://127.0.0.1:1/alice/films/").await;

    match result {
        Err(e @ FetchError::Network { .. }) => {
            assert_eq!(e.url(), "http://127.0.0.1:1/alice/films/");
        }
        other => panic!("Expected Network error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_pagination_resolves_last_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alice/films/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page("alice", &["Heat"], 7)),
        )
        .mount(&mock_server)
        .await;

    let (fetcher, _dir) = fetcher_for(&mock_server);
    let resolver = PaginationResolver::new(fetcher);
    let base_url = format!("{}/alice/films/", mock_server.uri());

    assert_eq!(resolver.resolve(&base_url).await, 7);
    assert_eq!(resolver.resolve(&base_url).await, 7);
}

#[tokio::test]
async fn test_pagination_defaults_to_one_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alice/films/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page("alice", &["Heat"], 1)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ghost/films/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let (fetcher, _dir) = fetcher_for(&mock_server);
    let resolver = PaginationResolver::new(fetcher);

    let found = resolver
        .resolve(&format!("{}/alice/films/", mock_server.uri()))
        .await;
    let missing = resolver
        .resolve(&format!("{}/ghost/films/", mock_server.uri()))
        .await;

    assert_eq!(found, 1);
    assert_eq!(missing, 1);
}
