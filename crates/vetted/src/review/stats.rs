//! Batch progress statistics.

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;

use super::item::{ReviewItem, ReviewOutcome, ReviewStatus};

/// Counts over the items of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    /// Not yet drafted.
    pub pending: usize,
    /// Drafted or critiqued, or approved but not yet stored.
    pub in_progress: usize,
    pub awaiting_human: usize,
    /// Approved as drafted (stored or not).
    pub accepted: usize,
    /// Approved with an edit (stored or not).
    pub edited: usize,
    pub rejected: usize,
    pub stored: usize,
    /// Terminal transitions so far.
    pub completed_reviews: usize,
    /// Reviews left before the next learning rebuild.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews_until_learning: Option<usize>,
}

impl BatchStats {
    /// Compute statistics for a set of items.
    pub fn from_items(items: &[ReviewItem], completed_reviews: usize, config: &PipelineConfig) -> Self {
        let mut stats = BatchStats {
            total: items.len(),
            completed_reviews,
            reviews_until_learning: config.reviews_until_rebuild(completed_reviews),
            ..Default::default()
        };

        for item in items {
            match item.status {
                ReviewStatus::Pending => stats.pending += 1,
                ReviewStatus::Drafted
                | ReviewStatus::Critiqued
                | ReviewStatus::Accepted
                | ReviewStatus::Edited => stats.in_progress += 1,
                ReviewStatus::AwaitingHuman => stats.awaiting_human += 1,
                ReviewStatus::Rejected => stats.rejected += 1,
                ReviewStatus::Stored => stats.stored += 1,
            }
            match item.outcome {
                Some(ReviewOutcome::Accepted) => stats.accepted += 1,
                Some(ReviewOutcome::Edited) => stats.edited += 1,
                _ => {}
            }
        }

        stats
    }

    /// Items in a terminal status.
    pub fn finished(&self) -> usize {
        self.stored + self.rejected
    }

    /// Items still to be reviewed.
    pub fn remaining(&self) -> usize {
        self.total - self.finished()
    }

    /// Whether every item is terminal.
    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Get the percentage of items finished.
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.finished() as f64 / self.total as f64) * 100.0
        }
    }

    /// Share of decided items that were approved (accepted or edited).
    pub fn approval_rate(&self) -> f64 {
        let decided = self.accepted + self.edited + self.rejected;
        if decided == 0 {
            0.0
        } else {
            (self.accepted + self.edited) as f64 / decided as f64 * 100.0
        }
    }

    /// Share of approvals that needed an edit.
    pub fn edit_rate(&self) -> f64 {
        let approved = self.accepted + self.edited;
        if approved == 0 {
            0.0
        } else {
            self.edited as f64 / approved as f64 * 100.0
        }
    }
}
