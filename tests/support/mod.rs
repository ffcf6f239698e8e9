//! Shared helpers for the integration suites.

#![allow(dead_code)]

use std::time::Duration;

use onboarding_client::{OnboardingClient, RetryPolicy, Transport};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Bearer token every mocked exchange hands out.
pub const TEST_TOKEN: &str = "test-token";

/// Builds a client against a mock server with fast retry delays.
pub fn client_for(server: &MockServer) -> OnboardingClient {
    let base_url = url::Url::parse(&format!("{}/", server.uri())).expect("mock server uri is valid");
    let policy = RetryPolicy::new(6, Duration::from_millis(10), Duration::from_millis(50));
    OnboardingClient::with_transport(base_url, Transport::with_policy(policy), "provider-id", "provider-secret")
        .expect("client builds against mock server")
}

/// The JSON body of a successful credential exchange.
pub fn token_body() -> serde_json::Value {
    serde_json::json!({
        "result": {
            "accessToken": TEST_TOKEN,
            "expiresIn": 3600,
            "tokenType": "Bearer"
        },
        "errors": [],
        "requestId": "req-1"
    })
}

/// Mounts a token endpoint that accepts any number of exchanges.
pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/dataProviders/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .mount(server)
        .await;
}

/// Mounts a token endpoint that expects exactly `n` exchanges.
pub async fn mount_token_expect(server: &MockServer, n: u64) {
    Mock::given(method("POST"))
        .and(path("/dataProviders/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(n)
        .mount(server)
        .await;
}

/// A minimal media file envelope for `media/files/{id}`.
pub fn media_file_body(id: &str) -> serde_json::Value {
    serde_json::json!({
        "result": {
            "id": id,
            "publicUrl": format!("https://media.example.com/{id}"),
            "metadata": { "filename": "lamp.jpg", "mimeType": "image/jpeg", "size": 10 }
        },
        "errors": [],
        "requestId": "req-2"
    })
}
