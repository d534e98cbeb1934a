//! Append-only review history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::critique::FlagSet;
use crate::review::{ReviewItem, ReviewOutcome};

/// One terminal review outcome, as remembered by the learning store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Position in the history, starting at zero.
    pub sequence: u64,
    pub hotel_id: String,
    pub hotel_name: String,
    pub city: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub star_rating: Option<u8>,
    /// How the review ended.
    pub outcome: ReviewOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_summary: Option<String>,
    /// Critique flags on the draft at review time.
    #[serde(default)]
    pub flags: FlagSet,
    /// Why the reviewer (or the pipeline) rejected the item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// When the review was decided.
    pub reviewed_at: DateTime<Utc>,
}

impl FeedbackRecord {
    /// Build a record from a decided item. Returns `None` for undecided items.
    pub fn from_item(item: &ReviewItem, sequence: u64) -> Option<Self> {
        let outcome = item.outcome?;
        let record = &item.record;

        Some(Self {
            sequence,
            hotel_id: record.id.clone(),
            hotel_name: record.name.clone(),
            city: record.city().to_string(),
            country: record.country().to_string(),
            star_rating: record.star_rating,
            outcome,
            draft_summary: item.draft_summary.clone(),
            final_summary: item.final_summary.clone(),
            flags: item.critique_flags.clone(),
            rejection_reason: item.rejection_reason.clone(),
            reviewed_at: item.review_timestamp.unwrap_or_default(),
        })
    }

    /// True for accepted or edited outcomes.
    pub fn is_approved(&self) -> bool {
        self.outcome.is_approved()
    }

    /// The approved text, if any.
    pub fn approved_summary(&self) -> Option<&str> {
        if self.is_approved() {
            self.final_summary.as_deref()
        } else {
            None
        }
    }
}
