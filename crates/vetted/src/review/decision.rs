//! Human decisions on a drafted summary.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VettedError};

/// What the reviewer decided for the item awaiting review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Decision {
    /// Keep the draft as the final summary.
    Accept,
    /// Replace the draft with this text.
    Edit { text: String },
    /// Turn the draft down, optionally saying why.
    Reject {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl Decision {
    /// Create an edit decision.
    pub fn edit(text: impl Into<String>) -> Self {
        Decision::Edit { text: text.into() }
    }

    /// Create a rejection with a reason.
    pub fn reject(reason: impl Into<String>) -> Self {
        Decision::Reject {
            reason: Some(reason.into()),
        }
    }

    /// Create a rejection without a reason.
    pub fn reject_silently() -> Self {
        Decision::Reject { reason: None }
    }

    /// Check the decision can be applied. Edits must contain text.
    pub fn validate(&self) -> Result<()> {
        match self {
            Decision::Edit { text } if text.trim().is_empty() => Err(VettedError::InvalidDecision(
                "edited summary is empty".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Accept => "accept",
            Decision::Edit { .. } => "edit",
            Decision::Reject { .. } => "reject",
        }
    }
}

/// Trim a reviewer's rejection reason, dropping it when blank.
pub(crate) fn clean_reason(reason: Option<&str>) -> Option<String> {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_edit_is_invalid() {
        assert!(matches!(
            Decision::edit("   \n\t").validate(),
            Err(VettedError::InvalidDecision(_))
        ));
        assert!(Decision::edit("A real summary.").validate().is_ok());
        assert!(Decision::Accept.validate().is_ok());
        assert!(Decision::reject_silently().validate().is_ok());
    }

    #[test]
    fn test_clean_reason() {
        assert_eq!(clean_reason(Some("  too salesy ")), Some("too salesy".to_string()));
        assert_eq!(clean_reason(Some("   ")), None);
        assert_eq!(clean_reason(None), None);
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_string(&Decision::edit("New text")).unwrap();
        assert_eq!(json, r#"{"action":"edit","text":"New text"}"#);

        let parsed: Decision = serde_json::from_str(r#"{"action":"reject"}"#).unwrap();
        assert_eq!(parsed, Decision::reject_silently());
    }
}
