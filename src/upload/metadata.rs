//! Upload metadata and its `Upload-Metadata` header encoding.
//!
//! The header consists of comma-separated `key value` pairs: keys are plain
//! ASCII, unique, free of spaces and commas; values are Base64-encoded UTF-8.
//! An empty value omits the separating space.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Caller-supplied description of a file being uploaded.
#[derive(Debug, Clone)]
pub struct UploadMetadata {
    /// Filename to store the file under.
    pub filename: String,
    /// MIME type of the content.
    pub mime_type: String,
    /// Declared size of the content in bytes (the `Upload-Length`).
    pub size: u64,
    /// Caller-supplied identifier for idempotent uploads.
    pub unique_identifier: Option<String>,
}

impl UploadMetadata {
    /// Creates metadata without a unique identifier.
    #[must_use]
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            size,
            unique_identifier: None,
        }
    }

    /// Sets the unique identifier, builder style.
    #[must_use]
    pub fn with_unique_identifier(mut self, unique_identifier: impl Into<String>) -> Self {
        self.unique_identifier = Some(unique_identifier.into());
        self
    }

    /// Serializes the metadata into an `Upload-Metadata` header value.
    ///
    /// Key order is stable: `filename`, `mimeType`, `size`, then
    /// `uniqueIdentifier` when present.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let mut pairs = vec![
            encode_pair("filename", &self.filename),
            encode_pair("mimeType", &self.mime_type),
            encode_pair("size", &self.size.to_string()),
        ];
        if let Some(unique_identifier) = self
            .unique_identifier
            .as_deref()
            .filter(|id| !id.is_empty())
        {
            pairs.push(encode_pair("uniqueIdentifier", unique_identifier));
        }
        pairs.join(",")
    }
}

/// Encodes one `key value` pair; an empty value leaves out the space.
fn encode_pair(key: &str, value: &str) -> String {
    if value.is_empty() {
        key.to_string()
    } else {
        format!("{key} {}", STANDARD.encode(value))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn decode(value: &str) -> String {
        String::from_utf8(STANDARD.decode(value).unwrap()).unwrap()
    }

    #[test]
    fn test_round_trip_reproduces_fields() {
        let metadata = UploadMetadata::new("lamp.jpg", "image/jpeg", 12345)
            .with_unique_identifier("sku-001");
        let header = metadata.to_header_value();

        let mut keys = Vec::new();
        for pair in header.split(',') {
            let (key, value) = pair.split_once(' ').unwrap();
            keys.push(key);
            match key {
                "filename" => assert_eq!(decode(value), "lamp.jpg"),
                "mimeType" => assert_eq!(decode(value), "image/jpeg"),
                "size" => assert_eq!(decode(value), "12345"),
                "uniqueIdentifier" => assert_eq!(decode(value), "sku-001"),
                other => panic!("unexpected key {other}"),
            }
        }
        assert_eq!(keys, ["filename", "mimeType", "size", "uniqueIdentifier"]);
    }

    #[test]
    fn test_keys_are_unique_and_order_stable() {
        let header = UploadMetadata::new("a", "b", 1).to_header_value();
        let keys: Vec<&str> = header
            .split(',')
            .map(|pair| pair.split_once(' ').map_or(pair, |(k, _)| k))
            .collect();
        assert_eq!(keys, ["filename", "mimeType", "size"]);
    }

    #[test]
    fn test_empty_value_omits_space() {
        let metadata = UploadMetadata::new("", "text/plain", 3);
        let header = metadata.to_header_value();
        assert!(header.starts_with("filename,"));
    }

    #[test]
    fn test_blank_unique_identifier_is_left_out() {
        let metadata = UploadMetadata::new("f", "t", 1).with_unique_identifier("");
        assert!(!metadata.to_header_value().contains("uniqueIdentifier"));
    }

    #[test]
    fn test_values_survive_non_ascii_content() {
        let metadata = UploadMetadata::new("smörgåsbord.png", "image/png", 9);
        let header = metadata.to_header_value();
        let filename = header.split(',').next().unwrap();
        let (_, value) = filename.split_once(' ').unwrap();
        assert_eq!(decode(value), "smörgåsbord.png");
    }
}
