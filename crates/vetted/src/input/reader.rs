//! CSV/TSV reader for hotel records.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Result, VettedError};

use super::record::{HotelRecord, Location, QualityAttribute, QualityScores};
use super::source::{RecordBatch, SourceMetadata};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';'];

/// Reader configuration.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
        }
    }
}

/// One row of the hotel CSV. Every field is optional text so that bad values
/// surface at ingest rather than aborting the whole file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHotelRow {
    hotel_id: Option<String>,
    hotel_name: Option<String>,
    city: Option<String>,
    country: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    star_rating: Option<String>,
    cleanliness_base: Option<String>,
    comfort_base: Option<String>,
    facilities_base: Option<String>,
    location_base: Option<String>,
    staff_base: Option<String>,
    value_for_money_base: Option<String>,
}

impl RawHotelRow {
    fn score(&self, attribute: QualityAttribute) -> Option<f64> {
        let raw = match attribute {
            QualityAttribute::Cleanliness => &self.cleanliness_base,
            QualityAttribute::Comfort => &self.comfort_base,
            QualityAttribute::Facilities => &self.facilities_base,
            QualityAttribute::Location => &self.location_base,
            QualityAttribute::Staff => &self.staff_base,
            QualityAttribute::Value => &self.value_for_money_base,
        };
        parse_number(raw.as_deref())
    }

    fn into_record(self, row_idx: usize) -> HotelRecord {
        let mut scores = QualityScores::new();
        for attr in QualityAttribute::ALL {
            scores.set(attr, self.score(attr));
        }

        let city = present(self.city.as_deref()).unwrap_or_default();
        let country = present(self.country.as_deref()).unwrap_or_default();
        let location = if city.is_empty() && country.is_empty() {
            None
        } else {
            let mut loc = Location::new(city, country);
            if let (Some(lat), Some(lon)) = (
                parse_number(self.lat.as_deref()),
                parse_number(self.lon.as_deref()),
            ) {
                loc = loc.with_coordinates(lat, lon);
            }
            Some(loc)
        };

        let star_rating = parse_number(self.star_rating.as_deref())
            .filter(|r| r.fract() == 0.0 && (0.0..=255.0).contains(r))
            .map(|r| r as u8);

        HotelRecord {
            id: present(self.hotel_id.as_deref()).unwrap_or_else(|| format!("row-{}", row_idx + 1)),
            name: present(self.hotel_name.as_deref()).unwrap_or_else(|| "Unknown".to_string()),
            location,
            star_rating,
            scores,
        }
    }
}

/// Reads hotel record batches from delimited files.
pub struct RecordReader {
    config: ReaderConfig,
}

impl RecordReader {
    /// Create a reader with default configuration.
    pub fn new() -> Self {
        Self {
            config: ReaderConfig::default(),
        }
    }

    /// Create a reader with custom configuration.
    pub fn with_config(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Read a file into a batch, recording its hash for checkpoint matching.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<RecordBatch> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| VettedError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| VettedError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let hash = hash_bytes(&contents);

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents)?,
        };

        let records = self.read_bytes(&contents, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            _ => "delimited",
        }
        .to_string();

        let source = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            format,
            records.len(),
        );

        debug!(file = %source.file, rows = records.len(), "read hotel records");

        let batch = RecordBatch {
            source: Some(source),
            records,
        };
        batch.check_unique_ids()?;
        Ok(batch)
    }

    /// Parse bytes directly.
    pub fn read_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<Vec<HotelRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let mut records = Vec::new();
        for (row_idx, result) in reader.deserialize::<RawHotelRow>().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }
            let row = result?;
            records.push(row.into_record(row_idx));
        }

        if records.is_empty() {
            return Err(VettedError::NotFound("no hotel rows in input".to_string()));
        }

        Ok(records)
    }
}

impl Default for RecordReader {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA-256 digest in the `sha256:<hex>` form stored in checkpoints.
pub(crate) fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

/// Check if a value represents a missing value.
fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed == "-"
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !is_missing(v))
        .map(|v| v.trim().to_string())
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    present(value)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(VettedError::NotFound("no lines in input".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        // Consistent column counts beat raw frequency.
        let consistent = counts.iter().all(|&c| c == first_count);
        let score = if consistent {
            first_count * 1000
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "hotel_id,hotel_name,city,country,lat,lon,star_rating,\
cleanliness_base,comfort_base,facilities_base,location_base,staff_base,value_for_money_base";

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"a\tb\tc\n1\t2\t3\n4\t5\t6";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_read_full_row() {
        let data = format!(
            "{HEADER}\n1,Hotel Lumen,Lisbon,Portugal,38.7,-9.1,4,8.7,8.2,7.9,9.3,9.0,8.1\n"
        );
        let records = RecordReader::new().read_bytes(data.as_bytes(), b',').unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "1");
        assert_eq!(record.name, "Hotel Lumen");
        assert_eq!(record.city(), "Lisbon");
        assert_eq!(record.star_rating, Some(4));
        assert_eq!(record.scores.count(), 6);
        assert_eq!(record.scores.value, Some(8.1));
        let coords = record.location.as_ref().unwrap().coordinates.unwrap();
        assert_eq!(coords.lat, 38.7);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_bad_values_become_missing() {
        let data = format!("{HEADER}\n2,Blank Inn,,NA,,,four,x,,,,,\n");
        let records = RecordReader::new().read_bytes(data.as_bytes(), b',').unwrap();
        let record = &records[0];

        assert!(record.location.is_none());
        assert_eq!(record.star_rating, None);
        assert_eq!(record.scores.count(), 0);
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_missing_id_gets_row_number() {
        let data = format!("{HEADER}\n,Anon,Rome,Italy,,,3,7,,,,,\n");
        let records = RecordReader::new().read_bytes(data.as_bytes(), b',').unwrap();
        assert_eq!(records[0].id, "row-1");
    }

    #[test]
    fn test_is_missing() {
        assert!(is_missing(""));
        assert!(is_missing("NA"));
        assert!(is_missing("n/a"));
        assert!(is_missing("NaN"));
        assert!(!is_missing("0"));
        assert!(!is_missing("Rome"));
    }

    #[test]
    fn test_hash_format() {
        assert!(hash_bytes(b"abc").starts_with("sha256:"));
        assert_eq!(hash_bytes(b"abc"), hash_bytes(b"abc"));
    }
}
