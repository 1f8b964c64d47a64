//! HTTP transport tests: auth header injection, retry behaviour and
//! response parsing against a local mock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use erp_sync::auth::TokenCache;
use erp_sync::client::HttpClient;
use erp_sync::config::{ApiConfig, AuthType};
use erp_sync::resilience::RetryConfig;

fn api_for(server: &MockServer) -> ApiConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    ApiConfig {
        base_url: server.uri(),
        retry_attempts: 0,
        ..Default::default()
    }
}

fn fast_retries(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(10),
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

#[tokio::test]
async fn server_errors_exhaust_the_full_retry_budget() {
    let server = MockServer::start().await;
    // max_attempts = 3 means the initial attempt plus two retries.
    Mock::given(method("GET"))
        .and(path("/things"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = HttpClient::with_retry_config(&api_for(&server), fast_retries(3)).unwrap();
    let result = client.get("/things").await;

    assert!(result.is_err());
    server.verify().await;
}

#[tokio::test]
async fn client_errors_fail_without_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::with_retry_config(&api_for(&server), fast_retries(5)).unwrap();
    let result = client.get("/missing").await;

    assert!(result.is_err());
    server.verify().await;
}

#[tokio::test]
async fn disabled_retries_make_exactly_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/probe"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::with_retry_config(&api_for(&server), RetryConfig::disabled()).unwrap();
    assert!(client.get("/probe").await.is_err());
    server.verify().await;
}

#[tokio::test]
async fn recovery_after_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let client = HttpClient::with_retry_config(&api_for(&server), fast_retries(3)).unwrap();
    let value = client.get("/flaky").await.unwrap();
    assert_eq!(value, json!({ "ok": true }));
}

#[tokio::test]
async fn api_key_auth_sets_literal_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(header("X-API-Key", "sekrit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pong": true })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiConfig {
        auth_type: AuthType::ApiKey,
        api_key: Some("sekrit".to_string()),
        ..api_for(&server)
    };
    let client = HttpClient::new(&api).unwrap();
    client.get("/ping").await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn bearer_auth_sets_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiConfig {
        auth_type: AuthType::Bearer,
        api_key: Some("tok-1".to_string()),
        ..api_for(&server)
    };
    HttpClient::new(&api).unwrap().get("/ping").await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn basic_auth_encodes_credentials() {
    let server = MockServer::start().await;
    // base64("ada:pw")
    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(header("Authorization", "Basic YWRhOnB3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiConfig {
        auth_type: AuthType::Basic,
        username: Some("ada".to_string()),
        password: Some("pw".to_string()),
        ..api_for(&server)
    };
    HttpClient::new(&api).unwrap().get("/ping").await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn oauth2_token_is_exchanged_once_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "t-123",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .and(header("Authorization", "Bearer t-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .expect(2)
        .mount(&server)
        .await;

    let api = ApiConfig {
        auth_type: AuthType::OAuth2,
        client_id: Some("client".to_string()),
        client_secret: Some("secret".to_string()),
        token_url: Some(format!("{}/oauth/token", server.uri())),
        ..api_for(&server)
    };
    let client = HttpClient::new(&api).unwrap();

    client.get("/data").await.unwrap();
    client.get("/data").await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn invalidated_token_is_reacquired_on_next_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "t-456",
            "expires_in": 3600
        })))
        .expect(2)
        .mount(&server)
        .await;

    let api = ApiConfig {
        auth_type: AuthType::OAuth2,
        client_id: Some("client".to_string()),
        client_secret: Some("secret".to_string()),
        token_url: Some(format!("{}/oauth/token", server.uri())),
        ..api_for(&server)
    };
    let http = reqwest::Client::new();
    let cache = TokenCache::new();

    assert_eq!(cache.bearer_token(&api, &http).await.unwrap(), "t-456");
    // Cached; no second exchange yet.
    assert_eq!(cache.bearer_token(&api, &http).await.unwrap(), "t-456");

    cache.invalidate().await;
    assert_eq!(cache.bearer_token(&api, &http).await.unwrap(), "t-456");
    server.verify().await;
}

#[tokio::test]
async fn non_json_responses_come_back_as_raw_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("11.13.18.05")
                .insert_header("Content-Type", "text/plain"),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new(&api_for(&server)).unwrap();
    let value = client.get("/version").await.unwrap();
    assert_eq!(value, serde_json::Value::String("11.13.18.05".to_string()));
}
