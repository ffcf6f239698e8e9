//! Onboarding Ingestion Client
//!
//! Client library for pushing structured entity batches and binary media
//! into the ingestion service, and for retrieving or deleting media
//! metadata.
//!
//! # Architecture
//!
//! - [`transport`] - resilient HTTP execution with retry/backoff
//! - [`auth`] - bearer token exchange and single-slot caching
//! - [`import`] - entity batch types and pre-network validation
//! - [`media`] - media DTOs and the `ApiResult` envelope
//! - [`response`] - partial-success aggregation for batch operations
//! - [`upload`] - resumable chunked uploads (TUS-style)
//! - [`blocking`] - synchronous wrappers over the async client
//!
//! The entry point is [`OnboardingClient`]: one instance per credential
//! pair, owning its connection pool and token cache.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod blocking;
mod client;
mod error;
pub mod import;
pub mod media;
pub mod response;
pub mod transport;
pub mod upload;

// Re-export commonly used types
pub use blocking::BlockingClient;
pub use client::{DEFAULT_BASE_URL, OnboardingClient};
pub use error::OnboardingError;
pub use import::{
    DynamicEntity, DynamicProperty, ImportBatchResult, StartImportResponse, ValidationError,
    validate_entities,
};
pub use media::{ApiError, ApiResult, FileUploadFromLink, MediaFileDto, UploadDto, UploadState};
pub use response::PartialSuccessResponse;
pub use transport::{RetryPolicy, Transport, TransportError};
pub use upload::{CHUNK_SIZE, Progress, UploadMetadata};
