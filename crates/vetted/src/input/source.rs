//! Batch source metadata.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VettedError};

use super::record::HotelRecord;

/// Metadata about the input file a batch was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// When the file was read.
    pub read_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been read.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count,
            read_at: Utc::now(),
        }
    }
}

/// A batch of hotel records ready for ingest.
#[derive(Debug, Clone, Default)]
pub struct RecordBatch {
    /// Where the records came from, if a file.
    pub source: Option<SourceMetadata>,
    /// The records, in input order.
    pub records: Vec<HotelRecord>,
}

impl RecordBatch {
    /// Create a batch from in-memory records.
    pub fn from_records(records: Vec<HotelRecord>) -> Self {
        Self {
            source: None,
            records,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fail with `DuplicateRecord` on the first repeated identifier.
    pub fn check_unique_ids(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for record in &self.records {
            if !seen.insert(record.id.as_str()) {
                return Err(VettedError::DuplicateRecord(record.id.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_ids_detected() {
        let batch = RecordBatch::from_records(vec![
            HotelRecord::new("a", "One"),
            HotelRecord::new("b", "Two"),
            HotelRecord::new("a", "Three"),
        ]);

        match batch.check_unique_ids() {
            Err(VettedError::DuplicateRecord(id)) => assert_eq!(id, "a"),
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[test]
    fn test_metadata_file_name() {
        let meta = SourceMetadata::new(
            PathBuf::from("data/hotels.csv"),
            "sha256:00".to_string(),
            10,
            "csv".to_string(),
            2,
        );
        assert_eq!(meta.file, "hotels.csv");
    }
}
