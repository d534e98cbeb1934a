//! Input records and the CSV record source.

mod reader;
mod record;
mod source;

pub use reader::{ReaderConfig, RecordReader};
pub use record::{Coordinates, HotelRecord, Location, QualityAttribute, QualityScores};
pub use source::{RecordBatch, SourceMetadata};
