//! Retry policy with exponential backoff for transient transport failures.
//!
//! Every outbound exchange is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - connection failures, timeouts, 5xx responses
//! - [`FailureType::RateLimited`] - HTTP 429, retried with the same backoff
//! - [`FailureType::Permanent`] - client errors (400/401/403/404/409 and the
//!   rest of the 4xx range) that retrying cannot fix
//!
//! The [`RetryPolicy`] then decides whether to retry based on failure type and
//! attempt count, calculating the backoff delay with jitter.
//!
//! Only idempotent-safe conditions are retried. Retrying arbitrary non-2xx
//! responses would risk duplicate side effects on non-idempotent endpoints
//! such as entity import.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

/// Default maximum attempts for one logical exchange (including the first).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;

/// Base delay for the first retry (2 seconds).
const BASE_DELAY: Duration = Duration::from_secs(2);

/// Ceiling applied to the computed delay (15 seconds).
const MAX_DELAY: Duration = Duration::from_secs(15);

/// Maximum jitter added to delays (100ms).
const MAX_JITTER: Duration = Duration::from_millis(100);

/// Classification of a failed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: connection refused, request timeout, 5xx responses.
    Transient,

    /// Permanent failure that won't succeed regardless of retries.
    ///
    /// Examples: 400 Bad Request, 401/403 rejections, 404 Not Found,
    /// 409 Conflict.
    Permanent,

    /// Server rate limiting (HTTP 429). Retried with backoff.
    RateLimited,
}

/// Decision on whether to retry a failed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// # Delay Calculation
///
/// ```text
/// delay = min(2^attempt seconds + jitter(0..100ms), 15s)
/// ```
///
/// With the default of 6 attempts the waits are approximately
/// 2s, 4s, 8s, 15s, 15s before giving up.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Delay before the first retry; doubles each attempt.
    base_delay: Duration,

    /// Ceiling applied to the computed delay.
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: BASE_DELAY,
            max_delay: MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a retry policy with custom settings.
    ///
    /// `max_attempts` includes the initial attempt (minimum 1).
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Creates a policy with a custom attempt bound (minimum 1).
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Determines whether a failed exchange should be retried.
    ///
    /// `attempt` is the attempt number that just failed (1-indexed).
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        match failure_type {
            FailureType::Permanent => {
                return RetryDecision::DoNotRetry {
                    reason: "permanent failure - retry would not help".to_string(),
                };
            }
            FailureType::Transient | FailureType::RateLimited => {}
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Calculates the backoff delay for the attempt that just failed.
    ///
    /// Formula: `min(base * 2^(attempt - 1) + jitter, max_delay)` - the cap is
    /// applied after jitter so the wait never exceeds `MAX_DELAY`.
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let backoff = self.base_delay.saturating_mul(2u32.saturating_pow(exponent));
        (backoff + jitter()).min(self.max_delay)
    }
}

/// Generates random jitter between 0 and [`MAX_JITTER`].
///
/// Jitter spreads out retries when several exchanges fail at the same time.
fn jitter() -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_ms = rng.gen_range(0..=MAX_JITTER.as_millis() as u64);
    Duration::from_millis(jitter_ms)
}

/// Classifies an HTTP status code into a failure type.
///
/// | Status | Type | Rationale |
/// |--------|------|-----------|
/// | 400 | Permanent | Bad request - won't succeed on retry |
/// | 401 | Permanent | Rejected credentials - handled above this layer |
/// | 403 | Permanent | Forbidden - handled above this layer |
/// | 404 | Permanent | Resource doesn't exist |
/// | 409 | Permanent | Conflict - carries meaning for uploads |
/// | 429 | RateLimited | Retry with backoff |
/// | 5xx | Transient | Server may recover |
///
/// 2xx/3xx are never passed here; the transport hands those back to the
/// caller without consulting the policy.
#[must_use]
pub fn classify_status(status: u16) -> FailureType {
    match status {
        429 => FailureType::RateLimited,
        status if (500..600).contains(&status) => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

/// Classifies a request-level error (no response received) into a failure type.
///
/// Timeouts and connection failures are transient; everything else (TLS
/// configuration, malformed requests, body streaming errors) is permanent.
#[must_use]
pub fn classify_request_error(error: &reqwest::Error) -> FailureType {
    if error.is_timeout() || error.is_connect() {
        FailureType::Transient
    } else {
        FailureType::Permanent
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== RetryPolicy Tests ====================

    #[test]
    fn test_retry_policy_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 6);
    }

    #[test]
    fn test_retry_policy_max_attempts_minimum_is_one() {
        let policy = RetryPolicy::with_max_attempts(0);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn test_permanent_failure_never_retried() {
        let policy = RetryPolicy::default();
        let decision = policy.should_retry(FailureType::Permanent, 1);
        assert!(matches!(decision, RetryDecision::DoNotRetry { .. }));
    }

    #[test]
    fn test_transient_failure_retried_until_exhausted() {
        let policy = RetryPolicy::default();
        for attempt in 1..6 {
            let decision = policy.should_retry(FailureType::Transient, attempt);
            assert!(
                matches!(decision, RetryDecision::Retry { attempt: next, .. } if next == attempt + 1),
                "attempt {attempt} should retry"
            );
        }
        let decision = policy.should_retry(FailureType::Transient, 6);
        assert!(matches!(decision, RetryDecision::DoNotRetry { .. }));
    }

    #[test]
    fn test_rate_limited_is_retried() {
        let policy = RetryPolicy::default();
        let decision = policy.should_retry(FailureType::RateLimited, 1);
        assert!(matches!(decision, RetryDecision::Retry { .. }));
    }

    // ==================== Delay Calculation Tests ====================

    #[test]
    fn test_delay_first_attempt_is_two_seconds_plus_jitter() {
        let policy = RetryPolicy::default();
        let delay = policy.calculate_delay(1);
        assert!(delay >= Duration::from_secs(2));
        assert!(delay <= Duration::from_millis(2100));
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        let delay = policy.calculate_delay(2);
        assert!(delay >= Duration::from_secs(4));
        assert!(delay <= Duration::from_millis(4100));
    }

    #[test]
    fn test_delay_capped_at_fifteen_seconds() {
        let policy = RetryPolicy::default();
        for attempt in 4..=10 {
            assert!(policy.calculate_delay(attempt) <= Duration::from_secs(15));
        }
    }

    // ==================== Classification Tests ====================

    #[test]
    fn test_classify_client_errors_permanent() {
        for status in [400, 401, 403, 404, 409, 410, 451] {
            assert_eq!(classify_status(status), FailureType::Permanent);
        }
    }

    #[test]
    fn test_classify_429_rate_limited() {
        assert_eq!(classify_status(429), FailureType::RateLimited);
    }

    #[test]
    fn test_classify_server_errors_transient() {
        for status in [500, 502, 503, 504, 599] {
            assert_eq!(classify_status(status), FailureType::Transient);
        }
    }
}
