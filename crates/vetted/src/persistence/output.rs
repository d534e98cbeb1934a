//! Rows of the reviewed-summaries output file.

use serde::{Deserialize, Serialize};

use crate::critique::FlagSet;
use crate::error::{Result, VettedError};
use crate::review::ReviewItem;

/// One stored summary, as written to the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    pub hotel_id: String,
    pub hotel_name: String,
    pub draft_summary: String,
    pub final_summary: String,
    /// "accepted" or "edited".
    pub status: String,
    /// RFC 3339 review time.
    pub review_timestamp: String,
    /// JSON array of flag names, e.g. `["rating-missing"]`.
    pub critique_flags: String,
}

impl OutputRow {
    /// Build the row for an approved item.
    pub fn from_item(item: &ReviewItem) -> Result<Self> {
        let missing = |what: &str| {
            VettedError::Persistence(format!(
                "Cannot store '{}': {} is missing",
                item.hotel_id(),
                what
            ))
        };

        let outcome = item
            .outcome
            .filter(|o| o.is_approved())
            .ok_or_else(|| missing("an approved outcome"))?;
        let draft = item.draft_summary.clone().ok_or_else(|| missing("the draft"))?;
        let final_summary = item
            .final_summary
            .clone()
            .ok_or_else(|| missing("the final summary"))?;
        let timestamp = item
            .review_timestamp
            .ok_or_else(|| missing("the review timestamp"))?;

        Ok(Self {
            hotel_id: item.record.id.clone(),
            hotel_name: item.record.name.clone(),
            draft_summary: draft,
            final_summary,
            status: outcome.label().to_string(),
            review_timestamp: timestamp.to_rfc3339(),
            critique_flags: serde_json::to_string(&item.critique_flags)?,
        })
    }

    /// Parse the flag column back into a set.
    pub fn flags(&self) -> Result<FlagSet> {
        Ok(serde_json::from_str(&self.critique_flags)?)
    }
}
