//! File-backed persistence: JSON checkpoint plus CSV output.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Result, VettedError};

use super::checkpoint::Checkpoint;
use super::output::OutputRow;
use super::PersistenceLayer;

/// Persistence next to the input file.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    checkpoint_path: PathBuf,
    output_path: PathBuf,
}

impl FilePersistence {
    /// Use explicit paths for the checkpoint and the output file.
    pub fn new(checkpoint_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_path: checkpoint_path.into(),
            output_path: output_path.into(),
        }
    }

    /// Derive both paths from the input data file.
    ///
    /// # Example
    ///
    /// ```
    /// use vetted::FilePersistence;
    ///
    /// let persistence = FilePersistence::for_data_file("data/hotels.csv");
    /// assert_eq!(persistence.checkpoint_path().to_string_lossy(), "data/hotels.checkpoint.json");
    /// assert_eq!(persistence.output_path().to_string_lossy(), "data/hotels_reviewed.csv");
    /// ```
    pub fn for_data_file(data_path: impl AsRef<Path>) -> Self {
        let data_path = data_path.as_ref();
        Self::new(checkpoint_path(data_path), output_path(data_path))
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Read every stored output row.
    pub fn load_rows(&self) -> Result<Vec<OutputRow>> {
        if !self.output_path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.output_path).map_err(|e| {
            VettedError::Persistence(format!(
                "Failed to open output '{}': {}",
                self.output_path.display(),
                e
            ))
        })?;

        reader
            .deserialize()
            .collect::<std::result::Result<Vec<OutputRow>, _>>()
            .map_err(|e| {
                VettedError::Persistence(format!(
                    "Failed to parse output '{}': {}",
                    self.output_path.display(),
                    e
                ))
            })
    }

    fn rows_by_id(&self) -> Result<IndexMap<String, OutputRow>> {
        Ok(self
            .load_rows()?
            .into_iter()
            .map(|r| (r.hotel_id.clone(), r))
            .collect())
    }

    fn write_rows(&self, rows: &IndexMap<String, OutputRow>) -> Result<()> {
        write_replacing(&self.output_path, |writer| {
            let mut csv_writer = csv::Writer::from_writer(writer);
            for row in rows.values() {
                csv_writer.serialize(row)?;
            }
            csv_writer.flush().map_err(|e| {
                VettedError::Persistence(format!("Failed to write output rows: {}", e))
            })?;
            Ok(())
        })
    }

    /// Delete the checkpoint and the output file. Returns whether anything existed.
    pub fn reset(&self) -> Result<bool> {
        let mut removed = false;
        for path in [&self.checkpoint_path, &self.output_path] {
            if path.exists() {
                fs::remove_file(path).map_err(|e| {
                    VettedError::Persistence(format!(
                        "Failed to remove '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                removed = true;
            }
        }
        Ok(removed)
    }
}

impl PersistenceLayer for FilePersistence {
    fn save(&self, row: &OutputRow) -> Result<()> {
        let mut rows = self.rows_by_id()?;
        rows.insert(row.hotel_id.clone(), row.clone());
        self.write_rows(&rows)?;

        debug!(hotel_id = %row.hotel_id, rows = rows.len(), path = %self.output_path.display(), "Saved output row");
        Ok(())
    }

    fn remove(&self, hotel_id: &str) -> Result<bool> {
        let mut rows = self.rows_by_id()?;
        if rows.shift_remove(hotel_id).is_none() {
            return Ok(false);
        }
        self.write_rows(&rows)?;

        debug!(hotel_id, rows = rows.len(), path = %self.output_path.display(), "Removed output row");
        Ok(true)
    }

    fn checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        write_replacing(&self.checkpoint_path, |writer| {
            serde_json::to_writer_pretty(writer, checkpoint).map_err(|e| {
                VettedError::Persistence(format!("Failed to serialize checkpoint: {}", e))
            })
        })
    }

    fn load(&self) -> Result<Option<Checkpoint>> {
        let path = &self.checkpoint_path;
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path).map_err(|e| {
            VettedError::Persistence(format!("Failed to open file '{}': {}", path.display(), e))
        })?;

        let checkpoint: Checkpoint =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                VettedError::Persistence(format!(
                    "Failed to parse checkpoint '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        checkpoint.check_version()?;

        Ok(Some(checkpoint))
    }
}

/// Write to a sibling temp file, then rename it over `path`.
fn write_replacing<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                VettedError::Persistence(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let tmp = temp_path(path);
    let file = File::create(&tmp).map_err(|e| {
        VettedError::Persistence(format!("Failed to create file '{}': {}", tmp.display(), e))
    })?;

    let mut writer = BufWriter::new(file);
    let written = write(&mut writer).and_then(|_| {
        writer
            .flush()
            .and_then(|_| writer.get_ref().sync_all())
            .map_err(|e| {
                VettedError::Persistence(format!("Failed to write '{}': {}", tmp.display(), e))
            })
    });

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        VettedError::Persistence(format!(
            "Failed to replace '{}': {}",
            path.display(),
            e
        ))
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    path.with_file_name(format!(".{}.tmp", name))
}

/// Checkpoint file path for a data file.
///
/// # Example
///
/// ```
/// use vetted::persistence::checkpoint_path;
///
/// let path = checkpoint_path("data/hotels.csv");
/// assert_eq!(path.to_string_lossy(), "data/hotels.checkpoint.json");
/// ```
pub fn checkpoint_path(data_path: impl AsRef<Path>) -> PathBuf {
    let data_path = data_path.as_ref();
    let stem = data_path.file_stem().unwrap_or_default().to_string_lossy();
    let parent = data_path.parent().unwrap_or(Path::new("."));

    parent.join(format!("{}.checkpoint.json", stem))
}

/// Reviewed output path for a data file.
pub fn output_path(data_path: impl AsRef<Path>) -> PathBuf {
    let data_path = data_path.as_ref();
    let stem = data_path.file_stem().unwrap_or_default().to_string_lossy();
    let parent = data_path.parent().unwrap_or(Path::new("."));

    parent.join(format!("{}_reviewed.csv", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::LearningState;
    use tempfile::TempDir;

    fn row(id: &str, summary: &str) -> OutputRow {
        OutputRow {
            hotel_id: id.to_string(),
            hotel_name: format!("Hotel {}", id),
            draft_summary: summary.to_string(),
            final_summary: summary.to_string(),
            status: "accepted".to_string(),
            review_timestamp: "2026-01-01T12:00:00+00:00".to_string(),
            critique_flags: "[]".to_string(),
        }
    }

    #[test]
    fn test_paths() {
        assert_eq!(
            checkpoint_path("data/hotels.csv").to_string_lossy(),
            "data/hotels.checkpoint.json"
        );
        assert_eq!(
            output_path("hotels.tsv").to_string_lossy(),
            "hotels_reviewed.csv"
        );
        assert_eq!(
            temp_path(Path::new("data/hotels.checkpoint.json")).to_string_lossy(),
            "data/.hotels.checkpoint.json.tmp"
        );
    }

    #[test]
    fn test_save_upserts_by_hotel_id() {
        let dir = TempDir::new().unwrap();
        let persistence = FilePersistence::for_data_file(dir.path().join("hotels.csv"));

        persistence.save(&row("a", "First, with a comma.")).unwrap();
        persistence.save(&row("b", "Second.")).unwrap();
        persistence.save(&row("a", "First, revised.")).unwrap();

        let rows = persistence.load_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].hotel_id, "a");
        assert_eq!(rows[0].final_summary, "First, revised.");
        assert_eq!(rows[1].hotel_id, "b");
    }

    #[test]
    fn test_remove_rewrites_remaining_rows() {
        let dir = TempDir::new().unwrap();
        let persistence = FilePersistence::for_data_file(dir.path().join("hotels.csv"));
        assert!(!persistence.remove("a").unwrap());
        assert!(!persistence.output_path().exists());

        persistence.save(&row("a", "First.")).unwrap();
        persistence.save(&row("b", "Second.")).unwrap();
        assert!(persistence.remove("a").unwrap());

        let rows = persistence.load_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].hotel_id, "b");
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let dir = TempDir::new().unwrap();
        let persistence = FilePersistence::for_data_file(dir.path().join("nested/hotels.csv"));
        assert!(persistence.load().unwrap().is_none());

        let checkpoint = Checkpoint::new(None, 0, Vec::new(), LearningState::default(), Vec::new());
        persistence.checkpoint(&checkpoint).unwrap();

        let loaded = persistence.load().unwrap().unwrap();
        assert_eq!(loaded, checkpoint);
        assert!(!temp_path(persistence.checkpoint_path()).exists());
    }

    #[test]
    fn test_corrupt_checkpoint_is_an_error() {
        let dir = TempDir::new().unwrap();
        let persistence = FilePersistence::for_data_file(dir.path().join("hotels.csv"));
        fs::write(persistence.checkpoint_path(), "{ not json").unwrap();

        assert!(matches!(persistence.load(), Err(VettedError::Persistence(_))));
    }

    #[test]
    fn test_failed_write_keeps_previous_checkpoint() {
        let dir = TempDir::new().unwrap();
        let persistence = FilePersistence::for_data_file(dir.path().join("hotels.csv"));
        let checkpoint = Checkpoint::new(None, 3, Vec::new(), LearningState::default(), Vec::new());
        persistence.checkpoint(&checkpoint).unwrap();

        let result = write_replacing(persistence.checkpoint_path(), |_| {
            Err(VettedError::Persistence("disk full".to_string()))
        });
        assert!(result.is_err());

        let loaded = persistence.load().unwrap().unwrap();
        assert_eq!(loaded.completed_reviews, 3);
        assert!(!temp_path(persistence.checkpoint_path()).exists());
    }

    #[test]
    fn test_reset() {
        let dir = TempDir::new().unwrap();
        let persistence = FilePersistence::for_data_file(dir.path().join("hotels.csv"));
        assert!(!persistence.reset().unwrap());

        persistence.save(&row("a", "Summary.")).unwrap();
        assert!(persistence.reset().unwrap());
        assert!(persistence.load_rows().unwrap().is_empty());
    }
}
