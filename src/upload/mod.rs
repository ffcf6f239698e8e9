//! Resumable chunked uploads and their metadata.
//!
//! The public surface is [`UploadMetadata`] (what the caller supplies) and
//! [`Progress`] (what the chunk loop emits); the engine itself is driven
//! through the client's `upload_file` operations.

mod engine;
mod metadata;
mod progress;

pub use engine::CHUNK_SIZE;
pub use metadata::UploadMetadata;
pub use progress::Progress;

pub(crate) use engine::{UploadEngine, UploadOutcome};
