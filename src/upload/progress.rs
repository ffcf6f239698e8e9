//! Immutable progress snapshots emitted by the upload loop.

use serde::Deserialize;

/// A snapshot of how far an upload has come.
///
/// Emitted after each acknowledged chunk; also decoded from the upload
/// status endpoint. Snapshots are immutable - each chunk produces a new one.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Declared size of the whole upload in bytes.
    #[serde(default)]
    pub total_size: u64,

    /// Bytes acknowledged by the server so far.
    #[serde(default)]
    pub uploaded_size: u64,

    /// `floor(uploaded / total * 100)`.
    #[serde(default)]
    pub completed_percentage: f64,

    /// Whether the acknowledged offset has reached the declared size.
    #[serde(default)]
    pub is_completed: bool,
}

impl Progress {
    /// Creates a snapshot from the declared size and the acknowledged offset.
    #[must_use]
    pub fn new(total_size: u64, uploaded_size: u64) -> Self {
        let completed_percentage = if total_size == 0 {
            100.0
        } else {
            (uploaded_size as f64 / total_size as f64 * 100.0).floor()
        };
        Self {
            total_size,
            uploaded_size,
            completed_percentage,
            is_completed: uploaded_size >= total_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_is_floored() {
        let progress = Progress::new(3, 1);
        assert!((progress.completed_percentage - 33.0).abs() < f64::EPSILON);
        assert!(!progress.is_completed);
    }

    #[test]
    fn test_zero_offset_is_zero_percent() {
        let progress = Progress::new(100, 0);
        assert!((progress.completed_percentage - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_full_offset_completes() {
        let progress = Progress::new(100, 100);
        assert!((progress.completed_percentage - 100.0).abs() < f64::EPSILON);
        assert!(progress.is_completed);
    }

    #[test]
    fn test_mid_transfer_percentage_is_meaningful() {
        let progress = Progress::new(8 * 1024 * 1024, 4 * 1024 * 1024);
        assert!((progress.completed_percentage - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_upload_is_complete() {
        let progress = Progress::new(0, 0);
        assert!(progress.is_completed);
        assert!((progress.completed_percentage - 100.0).abs() < f64::EPSILON);
    }
}
