//! Error types for the transport layer.

use thiserror::Error;

/// Errors surfaced by the transport after internal retries are resolved.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error (DNS resolution, connection refused, TLS, etc.)
    #[error("network error calling {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before a response arrived.
    #[error("timeout calling {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// A retryable condition persisted through the attempt bound.
    #[error("giving up on {url} after {attempts} attempts (last status: {last_status:?})")]
    RetriesExhausted {
        /// The URL that kept failing.
        url: String,
        /// How many attempts were made.
        attempts: u32,
        /// The last HTTP status observed, if a response was received at all.
        last_status: Option<u16>,
    },

    /// The request body cannot be replayed, so the exchange cannot be retried.
    #[error("request body for {url} is not replayable")]
    NonReplayable {
        /// The URL of the unreplayable request.
        url: String,
    },

    /// Building the request failed before it was sent.
    #[error("failed to build request for {url}: {source}")]
    Build {
        /// The URL of the request.
        url: String,
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an exhaustion error.
    pub fn retries_exhausted(
        url: impl Into<String>,
        attempts: u32,
        last_status: Option<u16>,
    ) -> Self {
        Self::RetriesExhausted {
            url: url.into(),
            attempts,
            last_status,
        }
    }

    /// Creates a non-replayable-body error.
    pub fn non_replayable(url: impl Into<String>) -> Self {
        Self::NonReplayable { url: url.into() }
    }

    /// Creates a request-build error.
    pub fn build(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Build {
            url: url.into(),
            source,
        }
    }
}
