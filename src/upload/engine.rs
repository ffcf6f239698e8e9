//! Resumable chunked-upload state machine (TUS-style).
//!
//! The engine drives the `create -> chunked PATCH -> verify` protocol:
//!
//! 1. **Created** - a provisioning POST declares the total length and the
//!    serialized metadata; the `Location` header names the new upload
//!    resource and its trailing path segment is the file id. A missing
//!    `Location` is a protocol violation, never retried.
//! 2. **InProgress** - chunks of up to [`CHUNK_SIZE`] bytes are PATCHed
//!    strictly sequentially, each carrying the current offset. The offset
//!    after each chunk is whatever the server acknowledges in its
//!    `Upload-Offset` header, not `offset + bytes_sent` - the server's value
//!    is authoritative and guards against partial writes. A [`Progress`]
//!    snapshot is emitted after every chunk.
//! 3. **Completed / Failed** - completed when the final snapshot reaches the
//!    declared size; anything short of that (a content source that ran dry,
//!    a server that stopped advancing the offset) fails with the percentage
//!    actually completed, never silently returning a partial file.
//!
//! Cancellation is observed between chunks, never mid-chunk.

use futures_util::{Stream, StreamExt};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::metadata::UploadMetadata;
use super::progress::Progress;
use crate::auth::TokenManager;
use crate::error::OnboardingError;
use crate::transport::Transport;

/// Chunk size for resumable uploads (4 MiB).
pub const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Protocol version sent in the `Tus-Resumable` header.
const TUS_VERSION: &str = "1.0.0";

/// Body content type for chunk transfers.
const OFFSET_OCTET_STREAM: &str = "application/offset+octet-stream";

/// State of one resumable upload.
///
/// Mutated only by applying acknowledged chunk transfers; terminal when the
/// offset reaches the declared size.
#[derive(Debug, Clone)]
pub(crate) struct UploadSession {
    pub file_id: String,
    pub total_size: u64,
    pub offset: u64,
}

impl UploadSession {
    pub(crate) fn is_completed(&self) -> bool {
        self.offset >= self.total_size
    }
}

/// How the provisioning step ended.
#[derive(Debug)]
pub(crate) enum UploadOutcome {
    /// Every byte was acknowledged; the file can be fetched by this id.
    Completed { file_id: String },
    /// The service rejected the provisioning request (409 means the unique
    /// identifier already exists).
    Rejected { status: u16, body: String },
}

/// Drives resumable uploads over the shared transport and token machinery.
pub(crate) struct UploadEngine<'a> {
    pub transport: &'a Transport,
    pub tokens: &'a TokenManager,
    pub base_url: &'a Url,
}

impl UploadEngine<'_> {
    /// Runs a full upload: provision, chunk loop, completion check.
    ///
    /// `on_progress` observes every emitted snapshot; the final snapshot
    /// decides between completion and [`OnboardingError::UploadIncomplete`].
    pub(crate) async fn upload<R, F>(
        &self,
        content: R,
        metadata: &UploadMetadata,
        cancel: Option<&CancellationToken>,
        mut on_progress: F,
    ) -> Result<UploadOutcome, OnboardingError>
    where
        R: AsyncRead + Unpin,
        F: FnMut(&Progress),
    {
        let response = self.create_upload(metadata).await?;
        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            let status = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            debug!(status, "upload provisioning rejected");
            return Ok(UploadOutcome::Rejected { status, body });
        }

        let file_id = file_id_from_response(&response)?;
        info!(file_id, total_size = metadata.size, "upload resource created");

        let patch_url = self
            .base_url
            .join(&format!("media/uploads/files/{file_id}"))
            .map_err(|e| OnboardingError::protocol(format!("invalid file id in location: {e}")))?;

        let uploader = ChunkUploader {
            transport: self.transport,
            tokens: self.tokens,
            patch_url,
            session: UploadSession {
                file_id: file_id.clone(),
                total_size: metadata.size,
                offset: 0,
            },
            content,
            cancel: cancel.cloned(),
            finished: false,
        };

        let mut chunks = std::pin::pin!(uploader.into_stream());
        let mut last: Option<Progress> = None;
        while let Some(step) = chunks.next().await {
            let progress = step?;
            on_progress(&progress);
            last = Some(progress);
        }

        match last {
            Some(progress) if progress.is_completed => Ok(UploadOutcome::Completed { file_id }),
            Some(progress) => Err(OnboardingError::UploadIncomplete {
                completed_percentage: progress.completed_percentage,
            }),
            // A zero-length upload has no chunks to send.
            None if metadata.size == 0 => Ok(UploadOutcome::Completed { file_id }),
            None => Err(OnboardingError::UploadIncomplete {
                completed_percentage: 0.0,
            }),
        }
    }

    /// Provisions the upload resource (an empty POST declaring the length).
    async fn create_upload(
        &self,
        metadata: &UploadMetadata,
    ) -> Result<reqwest::Response, OnboardingError> {
        let url = self
            .base_url
            .join("media/uploads/files")
            .map_err(|e| OnboardingError::protocol(format!("invalid base URL: {e}")))?;
        let token = self.tokens.get_token(false).await?;
        let request = self
            .transport
            .request(Method::POST, url)
            .header(AUTHORIZATION, format!("Bearer {}", token.access_token()))
            .header("Tus-Resumable", TUS_VERSION)
            .header("Upload-Length", metadata.size.to_string())
            .header("Upload-Metadata", metadata.to_header_value())
            .header("Upload-Offset", "0");
        Ok(self.transport.send(request).await?)
    }
}

/// The chunk loop as a lazy, finite, non-restartable sequence of snapshots.
struct ChunkUploader<'a, R> {
    transport: &'a Transport,
    tokens: &'a TokenManager,
    patch_url: Url,
    session: UploadSession,
    content: R,
    cancel: Option<CancellationToken>,
    finished: bool,
}

impl<R: AsyncRead + Unpin> ChunkUploader<'_, R> {
    /// Transfers one chunk and returns the resulting snapshot.
    ///
    /// Returns `None` when the session is terminal: completed, cancelled,
    /// failed, or the content source ran dry.
    async fn step(&mut self) -> Option<Result<Progress, OnboardingError>> {
        if self.finished || self.session.is_completed() {
            return None;
        }

        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            self.finished = true;
            warn!(file_id = self.session.file_id, "upload cancelled between chunks");
            return Some(Err(OnboardingError::Cancelled));
        }

        match self.transfer_chunk().await {
            Ok(Some(progress)) => {
                if progress.is_completed {
                    self.finished = true;
                }
                Some(Ok(progress))
            }
            Ok(None) => {
                // Content source reported EOF short of the declared size.
                self.finished = true;
                None
            }
            Err(error) => {
                self.finished = true;
                Some(Err(error))
            }
        }
    }

    /// Reads and PATCHes the next chunk; `Ok(None)` means the source is dry.
    async fn transfer_chunk(&mut self) -> Result<Option<Progress>, OnboardingError> {
        let remaining = self.session.total_size - self.session.offset;
        let chunk_len = remaining.min(CHUNK_SIZE as u64) as usize;
        let mut buffer = vec![0u8; chunk_len];
        let read = self
            .content
            .read(&mut buffer)
            .await
            .map_err(|source| OnboardingError::ContentSource { source })?;
        if read == 0 {
            return Ok(None);
        }
        buffer.truncate(read);

        let token = self.tokens.get_token(false).await?;
        let request = self
            .transport
            .request(Method::PATCH, self.patch_url.clone())
            .header(AUTHORIZATION, format!("Bearer {}", token.access_token()))
            .header("Tus-Resumable", TUS_VERSION)
            .header("Upload-Offset", self.session.offset.to_string())
            .header(CONTENT_TYPE, OFFSET_OCTET_STREAM)
            .body(buffer);
        let response = self.transport.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OnboardingError::protocol(format!(
                "chunk transfer rejected with status {status}"
            )));
        }

        let acknowledged = acknowledged_offset(&response)?;
        let expected = self.session.offset + read as u64;
        if acknowledged > self.session.offset {
            self.session.offset = acknowledged.min(self.session.total_size);
        }
        if acknowledged != expected {
            // Partial or stalled acknowledgment; the source cannot rewind,
            // so the loop ends and the final snapshot decides the outcome.
            warn!(
                file_id = self.session.file_id,
                expected,
                acknowledged,
                "server acknowledged a different offset than sent"
            );
            self.finished = true;
        }

        debug!(
            file_id = self.session.file_id,
            offset = self.session.offset,
            total = self.session.total_size,
            "chunk acknowledged"
        );
        Ok(Some(Progress::new(
            self.session.total_size,
            self.session.offset,
        )))
    }

    /// Adapts the loop into a progress stream consumed by the driver.
    fn into_stream(self) -> impl Stream<Item = Result<Progress, OnboardingError>> {
        futures_util::stream::unfold(self, |mut uploader| async move {
            uploader.step().await.map(|item| (item, uploader))
        })
    }
}

/// Extracts the acknowledged offset from a chunk response.
fn acknowledged_offset(response: &reqwest::Response) -> Result<u64, OnboardingError> {
    response
        .headers()
        .get("Upload-Offset")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .ok_or_else(|| {
            OnboardingError::protocol("chunk response does not contain a valid Upload-Offset header")
        })
}

/// Extracts the file id from the provisioning response's `Location` header.
fn file_id_from_response(response: &reqwest::Response) -> Result<String, OnboardingError> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .and_then(trailing_segment)
        .map(ToString::to_string)
        .ok_or_else(|| {
            OnboardingError::protocol(
                "Upload failed. File creation response does not contain file location in header",
            )
        })
}

/// The last non-empty path segment of a location, if any.
fn trailing_segment(location: &str) -> Option<&str> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Location Parsing Tests ====================

    #[test]
    fn test_trailing_segment_of_absolute_location() {
        assert_eq!(
            trailing_segment("https://ingest.example.com/media/uploads/files/abc-123"),
            Some("abc-123")
        );
    }

    #[test]
    fn test_trailing_segment_ignores_trailing_slash() {
        assert_eq!(trailing_segment("/media/uploads/files/abc/"), Some("abc"));
    }

    #[test]
    fn test_trailing_segment_of_bare_id() {
        assert_eq!(trailing_segment("abc"), Some("abc"));
    }

    #[test]
    fn test_trailing_segment_of_empty_location() {
        assert_eq!(trailing_segment(""), None);
        assert_eq!(trailing_segment("///"), None);
    }

    // ==================== Session Tests ====================

    #[test]
    fn test_session_terminal_when_offset_reaches_total() {
        let mut session = UploadSession {
            file_id: "f".to_string(),
            total_size: 10,
            offset: 0,
        };
        assert!(!session.is_completed());
        session.offset = 10;
        assert!(session.is_completed());
    }
}
