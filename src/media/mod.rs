//! Media DTOs and the envelope the service wraps single results in.

use serde::Deserialize;

use crate::upload::Progress;

/// Envelope for single-result endpoints.
///
/// The status code mirrors the HTTP response and is filled in by the client
/// after decoding; everything else comes from the body. `errors` is populated
/// for failed calls (and for synthesized local outcomes such as a unique-id
/// lookup that found nothing).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct ApiResult<T> {
    /// The decoded result, when the call succeeded.
    #[serde(default)]
    pub result: Option<T>,

    /// Per-call errors reported by the service.
    #[serde(default)]
    pub errors: Vec<ApiError>,

    /// Server-assigned request id for tracing.
    #[serde(default)]
    pub request_id: Option<String>,

    /// HTTP status of the call; not part of the body.
    #[serde(skip)]
    pub status_code: u16,
}

impl<T> ApiResult<T> {
    /// An envelope with only a status code, no body.
    #[must_use]
    pub fn from_status(status_code: u16) -> Self {
        Self {
            result: None,
            errors: Vec::new(),
            request_id: None,
            status_code,
        }
    }

    /// An envelope carrying a single error message.
    #[must_use]
    pub fn from_error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            result: None,
            errors: vec![ApiError {
                message: message.into(),
            }],
            request_id: None,
            status_code,
        }
    }

    /// Whether the underlying call returned a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// One error entry inside an [`ApiResult`] or a partial-success failure map.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable error message.
    #[serde(default)]
    pub message: String,
}

impl ApiError {
    /// Creates an error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A media file as stored by the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFileDto {
    /// Server-assigned file id.
    pub id: String,
    /// Publicly reachable URL of the file.
    #[serde(default)]
    pub public_url: Option<String>,
    /// URL the file was fetched from, for link-sourced uploads.
    #[serde(default)]
    pub source_url: Option<String>,
    /// Where the file is stored.
    #[serde(default)]
    pub location: Option<StorageLocation>,
    /// File metadata recorded at upload time.
    #[serde(default)]
    pub metadata: Option<FileMetadata>,
}

/// Storage coordinates of a media file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLocation {
    #[serde(default)]
    pub host_name: Option<String>,
    #[serde(default)]
    pub container_name: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Metadata of a stored file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub media_info: Option<MediaInfo>,
}

/// Media-type specific details, present for video and image files.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    #[serde(default)]
    pub video: Option<VideoMetadata>,
    #[serde(default)]
    pub image: Option<ImageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    #[serde(default)]
    pub duration_in_seconds: u32,
    #[serde(default)]
    pub aspect_ratio: Option<AspectRatio>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectRatio {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub resolution: Option<Resolution>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    #[serde(default)]
    pub vertical: f64,
    #[serde(default)]
    pub horizontal: f64,
}

/// State of a server-side upload, reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UploadState {
    Created,
    Progress,
    Failed,
    Cancelled,
    Completed,
}

/// An upload tracked by the service (link-sourced or resumable).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDto {
    /// Server-assigned upload id.
    pub id: String,
    /// Bytes-level progress of the transfer, when known.
    #[serde(default)]
    pub progress: Option<Progress>,
    /// Current state of the upload.
    pub state: UploadState,
    /// Source URL for link-sourced uploads.
    #[serde(default)]
    pub source_url: Option<String>,
    /// Creation timestamp, as reported by the service.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last-update timestamp, as reported by the service.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Descriptor for uploading a file the service fetches from a URL.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadFromLink {
    /// URL the service fetches the file from.
    pub link: String,
    /// Filename to store the file under.
    pub filename: String,
    /// Caller-supplied identifier; uploads are skipped when it already exists.
    pub unique_identifier: String,
}

impl FileUploadFromLink {
    /// Creates a link-upload descriptor.
    #[must_use]
    pub fn new(
        link: impl Into<String>,
        filename: impl Into<String>,
        unique_identifier: impl Into<String>,
    ) -> Self {
        Self {
            link: link.into(),
            filename: filename.into(),
            unique_identifier: unique_identifier.into(),
        }
    }
}
