//! Integration tests for token acquisition and caching.

mod support;

use onboarding_client::{BlockingClient, OnboardingError};
use tokio_test::assert_ok;
use support::{TEST_TOKEN, client_for, mount_token_expect};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_token_cached_within_validity_window() {
    let server = MockServer::start().await;
    // Exactly one exchange, however many callers ask.
    mount_token_expect(&server, 1).await;

    let client = client_for(&server);
    let first = client.get_token(false).await.expect("first token");
    let second = client.get_token(false).await.expect("second token");

    assert_eq!(first, TEST_TOKEN);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_force_refresh_performs_new_exchange() {
    let server = MockServer::start().await;
    mount_token_expect(&server, 2).await;

    let client = client_for(&server);
    client.get_token(false).await.expect("initial token");
    let refreshed = client.get_token(true).await.expect("refreshed token");
    assert_eq!(refreshed, TEST_TOKEN);
}

#[tokio::test]
async fn test_exchange_sends_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dataProviders/tokens"))
        .and(body_partial_json(serde_json::json!({
            "id": "provider-id",
            "secret": "provider-secret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(support::token_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    tokio_test::assert_ok!(client.get_token(false).await);
}

#[tokio::test]
async fn test_rejected_credentials_surface_as_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dataProviders/tokens"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_token(false).await.expect_err("should be rejected");
    assert!(matches!(err, OnboardingError::Authentication { status: 400 }));
    assert_eq!(
        err.to_string(),
        "Couldn't obtain a token please check your dataprovider details"
    );
}

#[tokio::test]
async fn test_malformed_token_body_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dataProviders/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errors": [{"message": "no result"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_token(false).await.expect_err("missing result");
    assert!(matches!(err, OnboardingError::Protocol { .. }));
}

#[test]
fn test_blocking_surface_shares_the_async_path() {
    // The mock server needs a live multi-thread runtime for its background
    // task while the blocking client blocks on its own runtime.
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        mount_token_expect(&server, 1).await;
        server
    });

    let client = BlockingClient::from_client(client_for(&server)).expect("blocking client");
    let first = client.get_token(false).expect("token");
    let second = client.get_token(false).expect("cached token");
    assert_eq!(first, TEST_TOKEN);
    assert_eq!(first, second);
}
