//! Top-level error taxonomy of the client.
//!
//! Each variant maps to a distinct handling policy:
//!
//! | Variant | Retried? | Raised |
//! |---|---|---|
//! | [`Validation`](OnboardingError::Validation) | never | locally, before any network call |
//! | [`Authentication`](OnboardingError::Authentication) | never | credential exchange rejected |
//! | [`Access`](OnboardingError::Access) | never | 401/403 on a data-plane call |
//! | [`Transport`](OnboardingError::Transport) | internally, then surfaced | after bounded retries |
//! | [`Protocol`](OnboardingError::Protocol) | never | server broke the expected contract |
//! | [`UploadIncomplete`](OnboardingError::UploadIncomplete) | never | upload ended short of its declared size |
//! | [`ContentSource`](OnboardingError::ContentSource) | never | the local content source failed to read |
//! | [`Cancelled`](OnboardingError::Cancelled) | never | caller-requested abort |
//!
//! Partial per-item failures inside a batch are not errors at all; they live
//! in the failure map of a `PartialSuccessResponse`.

use thiserror::Error;

use crate::import::ValidationError;
use crate::transport::TransportError;

/// Errors surfaced by client operations.
#[derive(Debug, Error)]
pub enum OnboardingError {
    /// Local, caller-fixable payload problem detected before submission.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The credential exchange was rejected.
    #[error("Couldn't obtain a token please check your dataprovider details")]
    Authentication {
        /// HTTP status returned by the token endpoint.
        status: u16,
    },

    /// The data plane rejected a valid-looking token (401/403), typically a
    /// wrong datasource/provider pairing. The message retains the server's
    /// reason phrase plus guidance.
    #[error("{message}")]
    Access {
        /// HTTP status (401 or 403).
        status: u16,
        /// Reason phrase plus guidance suffix.
        message: String,
    },

    /// Connectivity, timeout, or a retryable status that persisted through
    /// the attempt bound.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server response violated the expected contract.
    #[error("{message}")]
    Protocol {
        /// What the server failed to provide.
        message: String,
    },

    /// The upload loop finished without reaching the declared size.
    #[error("Could only complete {completed_percentage} percentage of the file.")]
    UploadIncomplete {
        /// Percentage of the declared size that was acknowledged.
        completed_percentage: f64,
    },

    /// The local content source could not be read.
    #[error("failed to read upload content: {source}")]
    ContentSource {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The caller requested an abort before or between network steps.
    #[error("operation cancelled")]
    Cancelled,
}

impl OnboardingError {
    /// Creates a protocol-violation error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an access error from a data-plane 401/403 reason phrase.
    pub fn access(status: u16, reason: &str) -> Self {
        Self::Access {
            status,
            message: format!("{reason}. Check your dataprovider details and datasource name"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_message_carries_guidance_suffix() {
        let err = OnboardingError::access(403, "Forbidden");
        assert!(
            err.to_string()
                .ends_with("Check your dataprovider details and datasource name")
        );
        assert!(err.to_string().starts_with("Forbidden"));
    }

    #[test]
    fn test_upload_incomplete_message_carries_percentage() {
        let err = OnboardingError::UploadIncomplete {
            completed_percentage: 50.0,
        };
        assert_eq!(
            err.to_string(),
            "Could only complete 50 percentage of the file."
        );
    }
}
