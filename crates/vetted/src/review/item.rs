//! Per-record review state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::critique::FlagSet;
use crate::error::{Result, VettedError};
use crate::input::HotelRecord;

/// Where an item is in the review state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Ingested, not yet drafted.
    Pending,
    /// A draft summary exists.
    Drafted,
    /// Critique flags are attached.
    Critiqued,
    /// Waiting for a human decision.
    AwaitingHuman,
    /// Approved as drafted, not yet stored.
    Accepted,
    /// Approved with a human edit, not yet stored.
    Edited,
    /// Turned down by the reviewer or the pipeline.
    Rejected,
    /// Final summary committed to the output.
    Stored,
}

impl ReviewStatus {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "Pending",
            ReviewStatus::Drafted => "Drafted",
            ReviewStatus::Critiqued => "Critiqued",
            ReviewStatus::AwaitingHuman => "Awaiting review",
            ReviewStatus::Accepted => "Accepted",
            ReviewStatus::Edited => "Edited",
            ReviewStatus::Rejected => "Rejected",
            ReviewStatus::Stored => "Stored",
        }
    }

    /// Stored and Rejected items never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReviewStatus::Stored | ReviewStatus::Rejected)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: ReviewStatus) -> bool {
        use ReviewStatus::*;

        matches!(
            (self, next),
            (Pending, Drafted)
                | (Pending, Rejected)
                | (Drafted, Critiqued)
                | (Critiqued, AwaitingHuman)
                | (AwaitingHuman, Accepted)
                | (AwaitingHuman, Edited)
                | (AwaitingHuman, Rejected)
                | (Accepted, Stored)
                | (Edited, Stored)
        )
    }
}

/// How a review ended. Kept after the item is Stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewOutcome {
    Accepted,
    Edited,
    Rejected,
}

impl ReviewOutcome {
    /// Lowercase label, also used in the output file.
    pub fn label(&self) -> &'static str {
        match self {
            ReviewOutcome::Accepted => "accepted",
            ReviewOutcome::Edited => "edited",
            ReviewOutcome::Rejected => "rejected",
        }
    }

    /// Accepted or edited.
    pub fn is_approved(&self) -> bool {
        !matches!(self, ReviewOutcome::Rejected)
    }

    /// The status an item takes when the outcome is applied.
    pub fn status(&self) -> ReviewStatus {
        match self {
            ReviewOutcome::Accepted => ReviewStatus::Accepted,
            ReviewOutcome::Edited => ReviewStatus::Edited,
            ReviewOutcome::Rejected => ReviewStatus::Rejected,
        }
    }
}

/// A hotel record moving through review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub record: HotelRecord,

    pub status: ReviewStatus,

    /// Generated draft, set once drafting succeeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_summary: Option<String>,

    /// Flags from the last critique (or pipeline flags on rejection).
    #[serde(default)]
    pub critique_flags: FlagSet,

    /// Reviewer-facing explanation of each flag.
    #[serde(default)]
    pub critique_notes: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ReviewOutcome>,

    /// The approved text: the draft, or the human edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_summary: Option<String>,

    /// Reason given by the reviewer when rejecting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,

    /// When the item reached its outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_timestamp: Option<DateTime<Utc>>,

    /// Generator calls made for this item.
    #[serde(default)]
    pub generation_attempts: u32,
}

impl ReviewItem {
    /// Create a pending item for a record.
    pub fn new(record: HotelRecord) -> Self {
        Self {
            record,
            status: ReviewStatus::Pending,
            draft_summary: None,
            critique_flags: FlagSet::new(),
            critique_notes: Vec::new(),
            outcome: None,
            final_summary: None,
            rejection_reason: None,
            review_timestamp: None,
            generation_attempts: 0,
        }
    }

    pub fn hotel_id(&self) -> &str {
        &self.record.id
    }

    /// Move to `next`, enforcing the state machine.
    pub fn transition(&mut self, next: ReviewStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(VettedError::InvalidTransition {
                hotel_id: self.record.id.clone(),
                from: self.status.label().to_string(),
                to: next.label().to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Awaiting a human decision.
    pub fn is_awaiting(&self) -> bool {
        self.status == ReviewStatus::AwaitingHuman
    }

    /// Approved but not yet stored, e.g. after a failed write.
    pub fn is_uncommitted(&self) -> bool {
        matches!(self.status, ReviewStatus::Accepted | ReviewStatus::Edited)
    }
}
