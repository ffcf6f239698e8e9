//! Resilient HTTP transport shared by every operation of the client.
//!
//! The [`Transport`] wraps a single long-lived `reqwest::Client` (one
//! connection pool per client instance) and executes each logical exchange
//! under a [`RetryPolicy`]: connection failures, timeouts, 429 and 5xx
//! responses are retried with exponential backoff; everything else is handed
//! back to the caller unchanged. The layer knows nothing about tokens or
//! endpoint semantics.
//!
//! Retrying re-issues a clone of the exact same request, which requires the
//! body to be replayable. All request bodies in this crate are in-memory
//! buffers, so cloning always succeeds in practice.

mod error;
mod retry;

pub use error::TransportError;
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy, classify_request_error,
    classify_status,
};

use reqwest::{Client, ClientBuilder, Method, Request, RequestBuilder, Response};
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

/// Default HTTP connect timeout (30 seconds).
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default per-request timeout (5 minutes, uploads move 4 MiB per request).
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// What the last failed attempt looked like, for error mapping on exhaustion.
enum LastFailure {
    Status(u16),
    Request(reqwest::Error),
}

/// Resilient request executor.
///
/// Created once per client and reused for every exchange, taking advantage
/// of connection pooling. Dropping the owning client releases the pool.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    policy: RetryPolicy,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport {
    /// Creates a transport with the default retry policy and timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_policy(RetryPolicy::default())
    }

    /// Creates a transport with a custom retry policy.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_policy(policy: RetryPolicy) -> Self {
        // Redirects are not followed: the upload engine interprets Location
        // headers itself, and the service never redirects data-plane calls.
        let client = ClientBuilder::new()
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client, policy }
    }

    /// Starts building a request against the shared connection pool.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Builds and executes a request under the retry policy.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, TransportError> {
        let request = match builder.build() {
            Ok(request) => request,
            Err(source) => {
                let url = source
                    .url()
                    .map_or_else(|| "<unknown>".to_string(), ToString::to_string);
                return Err(TransportError::build(url, source));
            }
        };
        self.execute(request).await
    }

    /// Executes one logical exchange, retrying transient failures.
    ///
    /// Responses with non-retryable statuses (2xx, 3xx, and 4xx other than
    /// 429) are returned as `Ok` so callers can map them to their own
    /// semantics; only connectivity failures and exhausted retryable
    /// conditions become errors.
    pub async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let url = request.url().to_string();
        let mut attempt: u32 = 1;

        loop {
            let req = request
                .try_clone()
                .ok_or_else(|| TransportError::non_replayable(&url))?;

            let (failure_type, failure) = match self.client.execute(req).await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let classification = classify_status(status);
                    if !matches!(
                        classification,
                        FailureType::Transient | FailureType::RateLimited
                    ) {
                        return Ok(response);
                    }
                    (classification, LastFailure::Status(status))
                }
                Err(source) => (classify_request_error(&source), LastFailure::Request(source)),
            };

            match self.policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    warn!(
                        url = %url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "transient failure, backing off"
                    );
                    sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(url = %url, attempt, %reason, "not retrying");
                    return Err(match failure {
                        LastFailure::Status(status) => {
                            TransportError::retries_exhausted(&url, attempt, Some(status))
                        }
                        LastFailure::Request(source) if source.is_timeout() => {
                            TransportError::timeout(&url)
                        }
                        LastFailure::Request(source) => TransportError::network(&url, source),
                    });
                }
            }
        }
    }
}
