//! Bearer token acquisition and single-slot caching.
//!
//! The [`TokenManager`] exchanges the data provider's credentials for a
//! bearer token and caches it under one fixed slot - a client instance
//! assumes one credential pair for its lifetime. The cached entry is an
//! immutable [`CachedToken`] behind an `Arc`; refreshes replace the slot
//! atomically, so concurrent refreshes may race but can never corrupt it
//! (last write wins).
//!
//! A rejected credential exchange is terminal and is never retried here;
//! transient network faults are retried underneath by the transport.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use url::Url;

use crate::error::OnboardingError;
use crate::transport::{Transport, TransportError};

/// Fallback validity window when the server does not advertise a lifetime
/// (59 minutes, the conservative window of the reference behavior).
const FALLBACK_VALIDITY: Duration = Duration::from_secs(59 * 60);

/// Safety margin subtracted from the advertised lifetime so a token is
/// refreshed before the server stops accepting it.
const EXPIRY_SAFETY_MARGIN: Duration = Duration::from_secs(60);

/// An issued bearer token together with its local expiry instant.
///
/// Immutable once issued; a refresh supersedes the whole entry.
#[derive(Debug)]
pub struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    /// The opaque bearer token value.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Whether the token has passed its conservative expiry instant.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    id: &'a str,
    secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    result: Option<TokenInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenInfo {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

/// Exchanges provider credentials for bearer tokens and caches the result.
#[derive(Debug)]
pub struct TokenManager {
    transport: Arc<Transport>,
    token_url: Url,
    data_provider_id: String,
    data_provider_secret: String,
    cache: RwLock<Option<Arc<CachedToken>>>,
}

impl TokenManager {
    /// Creates a manager for one credential pair.
    ///
    /// # Errors
    ///
    /// Returns a protocol error when the token endpoint cannot be derived
    /// from the base URL.
    pub fn new(
        transport: Arc<Transport>,
        base_url: &Url,
        data_provider_id: impl Into<String>,
        data_provider_secret: impl Into<String>,
    ) -> Result<Self, OnboardingError> {
        let token_url = base_url
            .join("dataProviders/tokens")
            .map_err(|e| OnboardingError::protocol(format!("invalid base URL: {e}")))?;
        Ok(Self {
            transport,
            token_url,
            data_provider_id: data_provider_id.into(),
            data_provider_secret: data_provider_secret.into(),
            cache: RwLock::new(None),
        })
    }

    /// Returns a valid token, from cache when possible.
    ///
    /// A cache hit performs no network call. On miss, expiry, or
    /// `force_refresh`, a fresh exchange runs and the slot is replaced.
    ///
    /// # Errors
    ///
    /// [`OnboardingError::Authentication`] when the exchange is rejected,
    /// [`OnboardingError::Transport`] when connectivity fails.
    #[instrument(skip(self))]
    pub async fn get_token(
        &self,
        force_refresh: bool,
    ) -> Result<Arc<CachedToken>, OnboardingError> {
        if !force_refresh {
            if let Some(cached) = self.cache.read().await.as_ref() {
                if !cached.is_expired() {
                    debug!("token cache hit");
                    return Ok(Arc::clone(cached));
                }
            }
        }

        let fresh = Arc::new(self.exchange().await?);
        *self.cache.write().await = Some(Arc::clone(&fresh));
        debug!("token cache refreshed");
        Ok(fresh)
    }

    /// Performs the credential exchange against the token endpoint.
    async fn exchange(&self) -> Result<CachedToken, OnboardingError> {
        let request = self
            .transport
            .request(Method::POST, self.token_url.clone())
            .json(&TokenRequest {
                id: &self.data_provider_id,
                secret: &self.data_provider_secret,
            });
        let response = self.transport.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OnboardingError::Authentication {
                status: status.as_u16(),
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| TransportError::network(self.token_url.as_str(), e))?;
        let info = body
            .result
            .ok_or_else(|| OnboardingError::protocol("token response is missing its result"))?;

        Ok(CachedToken {
            access_token: info.access_token,
            expires_at: Instant::now() + validity_window(info.expires_in),
        })
    }
}

/// Local validity window for a token, from the advertised lifetime.
///
/// The advertised `expiresIn` is honored with a safety margin; a missing or
/// zero lifetime falls back to the fixed conservative window.
fn validity_window(expires_in_secs: u64) -> Duration {
    if expires_in_secs == 0 {
        return FALLBACK_VALIDITY;
    }
    let advertised = Duration::from_secs(expires_in_secs);
    advertised
        .saturating_sub(EXPIRY_SAFETY_MARGIN)
        .max(Duration::from_secs(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_honors_advertised_lifetime_with_margin() {
        assert_eq!(validity_window(3600), Duration::from_secs(3540));
    }

    #[test]
    fn test_validity_falls_back_when_not_advertised() {
        assert_eq!(validity_window(0), FALLBACK_VALIDITY);
    }

    #[test]
    fn test_validity_never_collapses_to_zero() {
        assert_eq!(validity_window(30), Duration::from_secs(1));
    }

    #[test]
    fn test_cached_token_expiry() {
        let live = CachedToken {
            access_token: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(60),
        };
        assert!(!live.is_expired());

        let expired = CachedToken {
            access_token: "t".to_string(),
            expires_at: Instant::now() - Duration::from_secs(1),
        };
        assert!(expired.is_expired());
    }
}
