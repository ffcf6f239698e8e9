//! The onboarding client: every public operation of the crate.
//!
//! An [`OnboardingClient`] owns its own connection pool and token cache,
//! constructed once and shared by reference; dropping it releases the pooled
//! connections. Every data-plane call carries a bearer token supplied by the
//! token manager (from cache or freshly exchanged) and runs through the
//! retrying transport.
//!
//! # Example
//!
//! ```no_run
//! use onboarding_client::{DynamicEntity, DynamicProperty, OnboardingClient};
//!
//! # async fn example() -> Result<(), onboarding_client::OnboardingError> {
//! let client = OnboardingClient::new("provider-id", "provider-secret");
//! let entities = vec![
//!     DynamicEntity::new("1").with_property(DynamicProperty::new("name", "number one")),
//!     DynamicEntity::new("2").with_property(DynamicProperty::new("name", "number two")),
//! ];
//! let response = client
//!     .start_entity_import("products", &entities, None, None)
//!     .await?;
//! assert!(response.is_accepted());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use url::Url;
use uuid::Uuid;

use crate::auth::TokenManager;
use crate::error::OnboardingError;
use crate::import::{
    DynamicEntity, ImportBatchResult, ImportRequest, StartImportResponse, ValidationError,
    validate_entities,
};
use crate::media::{ApiError, ApiResult, FileUploadFromLink, MediaFileDto, UploadDto};
use crate::response::PartialSuccessResponse;
use crate::transport::Transport;
use crate::upload::{Progress, UploadMetadata};
use crate::upload::{UploadEngine, UploadOutcome};

/// Default ingestion service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://ingest.occtoo.com/";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchLookupRequest<'a> {
    unique_identifiers: &'a [String],
}

/// Client for one data provider against the ingestion service.
#[derive(Debug)]
pub struct OnboardingClient {
    transport: Arc<Transport>,
    tokens: TokenManager,
    base_url: Url,
}

impl OnboardingClient {
    /// Creates a client for the default service endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the compiled-in default base URL fails to parse. This
    /// should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(
        data_provider_id: impl Into<String>,
        data_provider_secret: impl Into<String>,
    ) -> Self {
        let base_url = Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid");
        Self::with_transport(base_url, Transport::new(), data_provider_id, data_provider_secret)
            .expect("default base URL yields valid endpoints")
    }

    /// Creates a client against a custom endpoint.
    ///
    /// The base URL should end with a trailing slash so relative endpoint
    /// paths join underneath it.
    ///
    /// # Errors
    ///
    /// Returns a protocol error when endpoint URLs cannot be derived from
    /// the base URL.
    pub fn with_base_url(
        base_url: Url,
        data_provider_id: impl Into<String>,
        data_provider_secret: impl Into<String>,
    ) -> Result<Self, OnboardingError> {
        Self::with_transport(base_url, Transport::new(), data_provider_id, data_provider_secret)
    }

    /// Creates a client with a custom transport (retry policy, timeouts).
    ///
    /// # Errors
    ///
    /// Returns a protocol error when endpoint URLs cannot be derived from
    /// the base URL.
    pub fn with_transport(
        base_url: Url,
        transport: Transport,
        data_provider_id: impl Into<String>,
        data_provider_secret: impl Into<String>,
    ) -> Result<Self, OnboardingError> {
        let transport = Arc::new(transport);
        let tokens = TokenManager::new(
            Arc::clone(&transport),
            &base_url,
            data_provider_id,
            data_provider_secret,
        )?;
        Ok(Self {
            transport,
            tokens,
            base_url,
        })
    }

    /// Returns a bearer token for this provider, from cache when possible.
    ///
    /// # Errors
    ///
    /// [`OnboardingError::Authentication`] when the credentials are rejected.
    pub async fn get_token(&self, force_refresh: bool) -> Result<String, OnboardingError> {
        let token = self.tokens.get_token(force_refresh).await?;
        Ok(token.access_token().to_string())
    }

    /// Validates a batch of entities and imports it into a datasource.
    ///
    /// Validation runs locally before any network call; see
    /// [`validate_entities`] for the rules. A 202 means the batch was
    /// accepted for asynchronous processing.
    ///
    /// # Errors
    ///
    /// [`OnboardingError::Validation`] for payload problems,
    /// [`OnboardingError::Access`] when the service rejects the
    /// provider/datasource pairing (401/403),
    /// [`OnboardingError::Cancelled`] when `cancel` fired.
    #[instrument(skip(self, entities, cancel), fields(entities = entities.len()))]
    pub async fn start_entity_import(
        &self,
        data_source: &str,
        entities: &[DynamicEntity],
        correlation_id: Option<Uuid>,
        cancel: Option<&CancellationToken>,
    ) -> Result<StartImportResponse, OnboardingError> {
        ensure_not_cancelled(cancel)?;
        if data_source.trim().is_empty() {
            return Err(ValidationError::BlankArgument {
                name: "data_source",
            }
            .into());
        }
        let entities = validate_entities(entities)?;
        ensure_not_cancelled(cancel)?;

        let mut url = self.join(&format!("import/{data_source}"))?;
        if let Some(correlation_id) = correlation_id {
            url.query_pairs_mut()
                .append_pair("correlationId", &correlation_id.to_string());
        }

        let request = self
            .transport
            .request(Method::POST, url)
            .header(AUTHORIZATION, self.bearer().await?)
            .json(&ImportRequest {
                entities: &entities,
            });
        let response = self.transport.send(request).await?;

        let status = response.status();
        if matches!(status.as_u16(), 401 | 403) {
            return Err(OnboardingError::access(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unauthorized"),
            ));
        }

        let message = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await.unwrap_or_default();
        let result = serde_json::from_str::<ImportBatchResult>(&body).ok();
        info!(status = status.as_u16(), "entity import submitted");
        Ok(StartImportResponse {
            result,
            status_code: status.as_u16(),
            message,
        })
    }

    /// Fetches a media file's metadata by its server-assigned id.
    ///
    /// # Errors
    ///
    /// Transport-level failures only; a 404 is reported inside the
    /// [`ApiResult`].
    pub async fn get_file(&self, file_id: &str) -> Result<ApiResult<MediaFileDto>, OnboardingError> {
        let url = self.join(&format!("media/files/{file_id}"))?;
        let request = self
            .transport
            .request(Method::GET, url)
            .header(AUTHORIZATION, self.bearer().await?);
        let response = self.transport.send(request).await?;
        api_result(response).await
    }

    /// Fetches a media file's metadata by its caller-supplied unique id.
    ///
    /// Resolved through the batch endpoint; an id the service does not know
    /// yields a 404 envelope with "MediaFile not found in tenant".
    ///
    /// # Errors
    ///
    /// Transport-level failures only.
    pub async fn get_file_from_unique_id(
        &self,
        unique_identifier: &str,
    ) -> Result<ApiResult<MediaFileDto>, OnboardingError> {
        let response = self
            .get_files_batch(&[unique_identifier.to_string()])
            .await?;
        if !response.errors.is_empty() {
            return Ok(ApiResult {
                result: None,
                errors: response.errors,
                request_id: response.request_id,
                status_code: response.status_code,
            });
        }

        let found = response
            .result
            .as_ref()
            .and_then(|batch| batch.succeeded().values().next().cloned());
        match found {
            Some(file) => Ok(ApiResult {
                result: Some(file),
                errors: Vec::new(),
                request_id: response.request_id,
                status_code: response.status_code,
            }),
            None => Ok(ApiResult::from_error(404, "MediaFile not found in tenant")),
        }
    }

    /// Looks up many media files by unique id in one call.
    ///
    /// Per-item outcomes land in the partial-success mapping; one missing id
    /// never fails the others.
    ///
    /// # Errors
    ///
    /// Transport-level failures only.
    pub async fn get_files_batch(
        &self,
        unique_identifiers: &[String],
    ) -> Result<ApiResult<PartialSuccessResponse<String, MediaFileDto, ApiError>>, OnboardingError>
    {
        let url = self.join("media/files/batch")?;
        let request = self
            .transport
            .request(Method::POST, url)
            .header(AUTHORIZATION, self.bearer().await?)
            .json(&BatchLookupRequest { unique_identifiers });
        let response = self.transport.send(request).await?;
        api_result(response).await
    }

    /// Starts asynchronous uploads of files the service fetches by URL.
    ///
    /// The service performs the byte transfer itself; poll
    /// [`get_upload_status`](Self::get_upload_status) for completion. Files
    /// whose unique identifier already exists are skipped into the failure
    /// map. A 202 envelope means the batch was accepted.
    ///
    /// # Errors
    ///
    /// [`OnboardingError::Cancelled`] when `cancel` fired before submission,
    /// transport-level failures otherwise.
    pub async fn upload_from_links(
        &self,
        links: &[FileUploadFromLink],
        cancel: Option<&CancellationToken>,
    ) -> Result<ApiResult<PartialSuccessResponse<String, UploadDto, ApiError>>, OnboardingError>
    {
        ensure_not_cancelled(cancel)?;
        let url = self.join("media/uploads/links")?;
        let request = self
            .transport
            .request(Method::PUT, url)
            .header(AUTHORIZATION, self.bearer().await?)
            .json(&links);
        let response = self.transport.send(request).await?;
        api_result(response).await
    }

    /// Uploads a single link-sourced file and resolves its metadata.
    ///
    /// Requires a non-empty unique identifier; the file is resolved by that
    /// identifier once the submission is accepted.
    ///
    /// # Errors
    ///
    /// [`OnboardingError::Validation`] when the unique identifier is blank.
    pub async fn upload_from_link(
        &self,
        link: &FileUploadFromLink,
        cancel: Option<&CancellationToken>,
    ) -> Result<ApiResult<MediaFileDto>, OnboardingError> {
        if link.unique_identifier.trim().is_empty() {
            return Err(ValidationError::BlankUniqueIdentifier.into());
        }
        let submitted = self
            .upload_from_links(std::slice::from_ref(link), cancel)
            .await?;
        if submitted.status_code != 202 {
            return Ok(ApiResult {
                result: None,
                errors: submitted.errors,
                request_id: submitted.request_id,
                status_code: submitted.status_code,
            });
        }
        self.get_file_from_unique_id(&link.unique_identifier).await
    }

    /// Retrieves the state of an upload by its upload id.
    ///
    /// # Errors
    ///
    /// Transport-level failures only.
    pub async fn get_upload_status(
        &self,
        upload_id: &str,
    ) -> Result<ApiResult<UploadDto>, OnboardingError> {
        let url = self.join(&format!("media/uploads/{upload_id}"))?;
        let request = self
            .transport
            .request(Method::GET, url)
            .header(AUTHORIZATION, self.bearer().await?);
        let response = self.transport.send(request).await?;
        api_result(response).await
    }

    /// Deletes a media file by id. Success is a 204 envelope.
    ///
    /// # Errors
    ///
    /// Transport-level failures only; a 404 is reported in the envelope.
    pub async fn delete_file(&self, file_id: &str) -> Result<ApiResult<()>, OnboardingError> {
        let url = self.join(&format!("media/files/{file_id}"))?;
        let request = self
            .transport
            .request(Method::DELETE, url)
            .header(AUTHORIZATION, self.bearer().await?);
        let response = self.transport.send(request).await?;
        let status = response.status();
        if status.is_success() {
            debug!(file_id, "file deleted");
            return Ok(ApiResult::from_status(status.as_u16()));
        }
        api_result(response).await
    }

    /// Uploads local content through the resumable chunked protocol.
    ///
    /// `metadata.size` declares the total length; the content source must
    /// provide exactly that many bytes. See the upload engine docs for the
    /// protocol. On completion the finalized file metadata is fetched and
    /// returned; a provisioning conflict (409) is reported in the envelope.
    ///
    /// # Errors
    ///
    /// [`OnboardingError::UploadIncomplete`] when the acknowledged offset
    /// never reaches the declared size, [`OnboardingError::Protocol`] when
    /// the server breaks the upload contract,
    /// [`OnboardingError::Cancelled`] when `cancel` fired between chunks.
    pub async fn upload_file<R>(
        &self,
        content: R,
        metadata: &UploadMetadata,
        cancel: Option<&CancellationToken>,
    ) -> Result<ApiResult<MediaFileDto>, OnboardingError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        self.upload_file_with_progress(content, metadata, cancel, |_| {})
            .await
    }

    /// Like [`upload_file`](Self::upload_file), observing every progress
    /// snapshot the chunk loop emits.
    ///
    /// # Errors
    ///
    /// See [`upload_file`](Self::upload_file).
    pub async fn upload_file_with_progress<R, F>(
        &self,
        content: R,
        metadata: &UploadMetadata,
        cancel: Option<&CancellationToken>,
        on_progress: F,
    ) -> Result<ApiResult<MediaFileDto>, OnboardingError>
    where
        R: tokio::io::AsyncRead + Unpin,
        F: FnMut(&Progress),
    {
        ensure_not_cancelled(cancel)?;
        let engine = UploadEngine {
            transport: &self.transport,
            tokens: &self.tokens,
            base_url: &self.base_url,
        };
        match engine.upload(content, metadata, cancel, on_progress).await? {
            UploadOutcome::Completed { file_id } => self.get_file(&file_id).await,
            UploadOutcome::Rejected { status, body } => Ok(ApiResult::from_error(status, body)),
        }
    }

    /// Uploads local content unless its unique identifier already exists.
    ///
    /// Requires `metadata.unique_identifier`. When provisioning reports a
    /// conflict (409), the existing file is resolved by that identifier and
    /// returned as if freshly uploaded (status 200, not 409).
    ///
    /// # Errors
    ///
    /// [`OnboardingError::Validation`] when the unique identifier is absent
    /// or blank; otherwise see [`upload_file`](Self::upload_file).
    pub async fn upload_file_if_not_exist<R>(
        &self,
        content: R,
        metadata: &UploadMetadata,
        cancel: Option<&CancellationToken>,
    ) -> Result<ApiResult<MediaFileDto>, OnboardingError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let unique_identifier = metadata
            .unique_identifier
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or(ValidationError::BlankUniqueIdentifier)?
            .to_string();

        let uploaded = self.upload_file(content, metadata, cancel).await?;
        if uploaded.status_code == 409 {
            debug!(unique_identifier, "file already exists, resolving");
            return self.get_file_from_unique_id(&unique_identifier).await;
        }
        Ok(uploaded)
    }

    /// Joins an endpoint path under the base URL.
    fn join(&self, path: &str) -> Result<Url, OnboardingError> {
        self.base_url
            .join(path)
            .map_err(|e| OnboardingError::protocol(format!("invalid endpoint path {path}: {e}")))
    }

    /// Builds the `Authorization` header value from the cached token.
    async fn bearer(&self) -> Result<String, OnboardingError> {
        let token = self.tokens.get_token(false).await?;
        Ok(format!("Bearer {}", token.access_token()))
    }
}

/// Fails with [`OnboardingError::Cancelled`] when the token has fired.
fn ensure_not_cancelled(cancel: Option<&CancellationToken>) -> Result<(), OnboardingError> {
    if cancel.is_some_and(CancellationToken::is_cancelled) {
        return Err(OnboardingError::Cancelled);
    }
    Ok(())
}

/// Decodes an [`ApiResult`] envelope from a response, carrying the status.
///
/// An empty body yields a bare envelope; an undecodable body (the service
/// occasionally answers HTML through intermediate proxies) is reported as a
/// single error entry instead of being propagated as a decode failure.
async fn api_result<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<ApiResult<T>, OnboardingError> {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    if body.trim().is_empty() {
        return Ok(ApiResult::from_status(status));
    }
    match serde_json::from_str::<ApiResult<T>>(&body) {
        Ok(mut envelope) => {
            envelope.status_code = status;
            Ok(envelope)
        }
        Err(_) => {
            let snippet: String = body.chars().take(200).collect();
            Ok(ApiResult::from_error(status, snippet))
        }
    }
}
