//! Error types for the Vetted library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Vetted operations.
#[derive(Debug, Error)]
pub enum VettedError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A language model provider failed to answer.
    #[error("Provider error: {0}")]
    Provider(String),

    /// An input record is missing required fields or holds invalid values.
    #[error("Malformed record '{hotel_id}': {reason}")]
    MalformedRecord { hotel_id: String, reason: String },

    /// Two records in a batch share an identifier.
    #[error("Duplicate hotel identifier '{0}' in batch")]
    DuplicateRecord(String),

    /// The generator returned nothing usable, even after the retry.
    #[error("Generation failed for '{hotel_id}': {reason}")]
    GenerationFailure { hotel_id: String, reason: String },

    /// A human decision could not be applied.
    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    /// A review item was asked to move somewhere its status does not allow.
    #[error("Invalid transition for '{hotel_id}': {from} -> {to}")]
    InvalidTransition {
        hotel_id: String,
        from: String,
        to: String,
    },

    /// Durable write or read failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The checkpoint on disk was taken for a different input batch.
    #[error("Checkpoint was created for source {expected}, but input is {found}")]
    CheckpointMismatch { expected: String, found: String },

    /// Requested entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for Vetted operations.
pub type Result<T> = std::result::Result<T, VettedError>;
