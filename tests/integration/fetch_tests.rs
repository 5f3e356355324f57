//! Fetch client tests against a mock HTTP server

use super::fast_config;
use scrape_guardrails::{FetchClient, FetchError};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_returns_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Hello</h1>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = FetchClient::from_config(&fast_config(dir.path())).unwrap();

    let body = client
        .fetch(&format!("{}/page", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "<h1>Hello</h1>");
}

#[tokio::test]
async fn test_fetch_follows_redirects() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", format!("{}/new", base_url).as_str()),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = FetchClient::from_config(&fast_config(dir.path())).unwrap();

    let body = client.fetch(&format!("{}/old", base_url)).await.unwrap();
    assert_eq!(body, "moved here");
}

#[tokio::test]
async fn test_client_error_uses_every_attempt() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = FetchClient::from_config(&fast_config(dir.path())).unwrap();
    let url = format!("{}/missing", mock_server.uri());

    let err = client.fetch(&url).await.unwrap_err();
    assert!(err.is_terminal());
    assert_eq!(err.status(), Some(404));
    match err {
        FetchError::RetryExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, FetchError::HttpStatus { status: 404, .. }));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_transient_failures_recover() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = FetchClient::from_config(&fast_config(dir.path())).unwrap();

    let body = client
        .fetch(&format!("{}/flaky", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "ok");
    assert_eq!(client.breaker().failure_count(), 0);
}

#[tokio::test]
async fn test_open_circuit_fails_fast() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = fast_config(dir.path());
    config.breaker.fail_threshold = 2;
    config.breaker.cooldown_secs = 60.0;
    let client = FetchClient::from_config(&config).unwrap();
    let url = format!("{}/down", mock_server.uri());

    // two real requests open the circuit; the third attempt never reaches the server
    let err = client.fetch(&url).await.unwrap_err();
    match err {
        FetchError::RetryExhausted { last, .. } => {
            assert!(matches!(*last, FetchError::CircuitOpen));
        }
        other => panic!("unexpected error: {}", other),
    }
}
