//! Blocking wrappers over the async client.
//!
//! [`BlockingClient`] owns a current-thread tokio runtime and synchronously
//! awaits the exact same async code paths - the two surfaces can never
//! drift apart behaviorally. Intended for callers without a cooperative
//! scheduler; do not use it from inside an async context.

use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::client::OnboardingClient;
use crate::error::OnboardingError;
use crate::import::{DynamicEntity, StartImportResponse};
use crate::media::{ApiError, ApiResult, FileUploadFromLink, MediaFileDto, UploadDto};
use crate::response::PartialSuccessResponse;
use crate::upload::UploadMetadata;

/// Synchronous counterpart of [`OnboardingClient`].
#[derive(Debug)]
pub struct BlockingClient {
    runtime: Runtime,
    inner: OnboardingClient,
}

impl BlockingClient {
    /// Creates a blocking client for the default service endpoint.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the runtime cannot be created.
    pub fn new(
        data_provider_id: impl Into<String>,
        data_provider_secret: impl Into<String>,
    ) -> std::io::Result<Self> {
        Self::from_client(OnboardingClient::new(data_provider_id, data_provider_secret))
    }

    /// Wraps an existing async client; combine with
    /// [`OnboardingClient::with_base_url`] for custom endpoints.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the runtime cannot be created.
    pub fn from_client(inner: OnboardingClient) -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { runtime, inner })
    }

    /// See [`OnboardingClient::get_token`].
    ///
    /// # Errors
    ///
    /// See [`OnboardingClient::get_token`].
    pub fn get_token(&self, force_refresh: bool) -> Result<String, OnboardingError> {
        self.runtime.block_on(self.inner.get_token(force_refresh))
    }

    /// See [`OnboardingClient::start_entity_import`].
    ///
    /// # Errors
    ///
    /// See [`OnboardingClient::start_entity_import`].
    pub fn start_entity_import(
        &self,
        data_source: &str,
        entities: &[DynamicEntity],
        correlation_id: Option<Uuid>,
        cancel: Option<&CancellationToken>,
    ) -> Result<StartImportResponse, OnboardingError> {
        self.runtime.block_on(self.inner.start_entity_import(
            data_source,
            entities,
            correlation_id,
            cancel,
        ))
    }

    /// See [`OnboardingClient::get_file`].
    ///
    /// # Errors
    ///
    /// See [`OnboardingClient::get_file`].
    pub fn get_file(&self, file_id: &str) -> Result<ApiResult<MediaFileDto>, OnboardingError> {
        self.runtime.block_on(self.inner.get_file(file_id))
    }

    /// See [`OnboardingClient::get_file_from_unique_id`].
    ///
    /// # Errors
    ///
    /// See [`OnboardingClient::get_file_from_unique_id`].
    pub fn get_file_from_unique_id(
        &self,
        unique_identifier: &str,
    ) -> Result<ApiResult<MediaFileDto>, OnboardingError> {
        self.runtime
            .block_on(self.inner.get_file_from_unique_id(unique_identifier))
    }

    /// See [`OnboardingClient::get_files_batch`].
    ///
    /// # Errors
    ///
    /// See [`OnboardingClient::get_files_batch`].
    pub fn get_files_batch(
        &self,
        unique_identifiers: &[String],
    ) -> Result<ApiResult<PartialSuccessResponse<String, MediaFileDto, ApiError>>, OnboardingError>
    {
        self.runtime
            .block_on(self.inner.get_files_batch(unique_identifiers))
    }

    /// See [`OnboardingClient::upload_from_links`].
    ///
    /// # Errors
    ///
    /// See [`OnboardingClient::upload_from_links`].
    pub fn upload_from_links(
        &self,
        links: &[FileUploadFromLink],
        cancel: Option<&CancellationToken>,
    ) -> Result<ApiResult<PartialSuccessResponse<String, UploadDto, ApiError>>, OnboardingError>
    {
        self.runtime
            .block_on(self.inner.upload_from_links(links, cancel))
    }

    /// See [`OnboardingClient::upload_from_link`].
    ///
    /// # Errors
    ///
    /// See [`OnboardingClient::upload_from_link`].
    pub fn upload_from_link(
        &self,
        link: &FileUploadFromLink,
        cancel: Option<&CancellationToken>,
    ) -> Result<ApiResult<MediaFileDto>, OnboardingError> {
        self.runtime
            .block_on(self.inner.upload_from_link(link, cancel))
    }

    /// See [`OnboardingClient::get_upload_status`].
    ///
    /// # Errors
    ///
    /// See [`OnboardingClient::get_upload_status`].
    pub fn get_upload_status(&self, upload_id: &str) -> Result<ApiResult<UploadDto>, OnboardingError> {
        self.runtime.block_on(self.inner.get_upload_status(upload_id))
    }

    /// See [`OnboardingClient::delete_file`].
    ///
    /// # Errors
    ///
    /// See [`OnboardingClient::delete_file`].
    pub fn delete_file(&self, file_id: &str) -> Result<ApiResult<()>, OnboardingError> {
        self.runtime.block_on(self.inner.delete_file(file_id))
    }

    /// See [`OnboardingClient::upload_file`].
    ///
    /// The content source is still an async reader; `std::io::Cursor` over
    /// in-memory bytes and `tokio::fs::File` both qualify.
    ///
    /// # Errors
    ///
    /// See [`OnboardingClient::upload_file`].
    pub fn upload_file<R>(
        &self,
        content: R,
        metadata: &UploadMetadata,
        cancel: Option<&CancellationToken>,
    ) -> Result<ApiResult<MediaFileDto>, OnboardingError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        self.runtime
            .block_on(self.inner.upload_file(content, metadata, cancel))
    }

    /// See [`OnboardingClient::upload_file_if_not_exist`].
    ///
    /// # Errors
    ///
    /// See [`OnboardingClient::upload_file_if_not_exist`].
    pub fn upload_file_if_not_exist<R>(
        &self,
        content: R,
        metadata: &UploadMetadata,
        cancel: Option<&CancellationToken>,
    ) -> Result<ApiResult<MediaFileDto>, OnboardingError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        self.runtime
            .block_on(self.inner.upload_file_if_not_exist(content, metadata, cancel))
    }
}
