//! Metadata about an ingested upload.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Metadata about the uploaded data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path, when read from disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Full path to the file, when read from disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// SHA-256 hash of the uploaded bytes.
    pub hash: String,
    /// Upload size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, spreadsheet, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the data was ingested.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for an ingested byte stream.
    pub fn new(bytes: &[u8], format: String, row_count: usize, column_count: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash = format!("sha256:{:x}", hasher.finalize());

        Self {
            file: None,
            path: None,
            hash,
            size_bytes: bytes.len() as u64,
            format,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }

    /// Attach the path the bytes were read from.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.file = path.file_name().map(|s| s.to_string_lossy().into_owned());
        self.path = Some(path);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable() {
        let a = SourceMetadata::new(b"a,b\n1,2\n", "csv".into(), 1, 2);
        let b = SourceMetadata::new(b"a,b\n1,2\n", "csv".into(), 1, 2);
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.hash, SourceMetadata::new(b"a,b\n1,3\n", "csv".into(), 1, 2).hash);
    }

    #[test]
    fn test_with_path() {
        let meta = SourceMetadata::new(b"x", "csv".into(), 0, 1)
            .with_path(PathBuf::from("data/iris.csv"));
        assert_eq!(meta.file.as_deref(), Some("iris.csv"));
    }
}
