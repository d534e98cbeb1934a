//! Pipeline checkpoint snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VettedError};
use crate::input::SourceMetadata;
use crate::learning::{FeedbackRecord, LearningState};
use crate::review::{ReviewItem, ReviewStatus};

/// Current checkpoint format version.
pub const CHECKPOINT_VERSION: &str = "1.0.0";

/// Everything needed to resume a batch where it stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Format version.
    pub version: String,

    /// When this checkpoint was written.
    pub saved_at: DateTime<Utc>,

    /// The batch input, if read from a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetadata>,

    /// Terminal transitions so far.
    pub completed_reviews: usize,

    /// Every item in batch order.
    pub items: Vec<ReviewItem>,

    /// Learned state at the time of writing.
    pub learning_state: LearningState,

    /// Full review history behind the learned state.
    #[serde(default)]
    pub learning_history: Vec<FeedbackRecord>,

    /// Learning rebuilds performed before this checkpoint.
    #[serde(default)]
    pub learning_rebuilds: usize,
}

impl Checkpoint {
    /// Create a checkpoint stamped with the current time.
    pub fn new(
        source: Option<SourceMetadata>,
        completed_reviews: usize,
        items: Vec<ReviewItem>,
        learning_state: LearningState,
        learning_history: Vec<FeedbackRecord>,
    ) -> Self {
        Self {
            version: CHECKPOINT_VERSION.to_string(),
            saved_at: Utc::now(),
            source,
            completed_reviews,
            items,
            learning_state,
            learning_history,
            learning_rebuilds: 0,
        }
    }

    /// Record how many learning rebuilds produced `learning_state`.
    pub fn with_learning_rebuilds(mut self, rebuilds: usize) -> Self {
        self.learning_rebuilds = rebuilds;
        self
    }

    /// Reject checkpoints written by an incompatible format.
    pub fn check_version(&self) -> Result<()> {
        let major = |v: &str| v.split('.').next().unwrap_or("").to_string();
        if major(&self.version) != major(CHECKPOINT_VERSION) {
            return Err(VettedError::Persistence(format!(
                "Unsupported checkpoint version {} (expected {})",
                self.version, CHECKPOINT_VERSION
            )));
        }
        Ok(())
    }

    /// Index of the earliest item that is not terminal.
    pub fn next_index(&self) -> Option<usize> {
        self.items.iter().position(|i| !i.status.is_terminal())
    }

    /// Whether every item is terminal.
    pub fn is_complete(&self) -> bool {
        self.next_index().is_none()
    }

    /// Number of items with `status`.
    pub fn count(&self, status: ReviewStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }
}
