//! The learned artifacts that condition generation.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Word count targeted before any summary has been approved.
pub const DEFAULT_TARGET_WORDS: f64 = 80.0;

/// Which element a summary tends to open with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentenceStructure {
    Unspecified,
    NameFirst,
    LocationFirst,
    RatingFirst,
}

impl Default for SentenceStructure {
    fn default() -> Self {
        SentenceStructure::Unspecified
    }
}

impl SentenceStructure {
    /// Classified structures, in tie-break order.
    pub const CLASSIFIED: [SentenceStructure; 3] = [
        SentenceStructure::NameFirst,
        SentenceStructure::LocationFirst,
        SentenceStructure::RatingFirst,
    ];

    /// Instruction text for prompts.
    pub fn describe(&self) -> &'static str {
        match self {
            SentenceStructure::Unspecified => "no preferred opening",
            SentenceStructure::NameFirst => "open with the hotel name",
            SentenceStructure::LocationFirst => "open with the location",
            SentenceStructure::RatingFirst => "open with the star rating",
        }
    }
}

/// Stylistic statistics over approved summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleGuide {
    /// Number of approved summaries the guide was built from.
    pub sample_size: usize,
    pub average_word_count: f64,
    pub structure: SentenceStructure,
    /// Most frequent two-word sentence openers.
    pub common_openers: Vec<String>,
    /// Share of approvals that needed a human edit.
    pub edited_share: f64,
    /// Edited summaries come out shorter than their drafts on average.
    pub prefers_concise: bool,
}

impl Default for StyleGuide {
    fn default() -> Self {
        Self {
            sample_size: 0,
            average_word_count: DEFAULT_TARGET_WORDS,
            structure: SentenceStructure::Unspecified,
            common_openers: Vec::new(),
            edited_share: 0.0,
            prefers_concise: false,
        }
    }
}

impl StyleGuide {
    /// True when no approved summary has shaped this guide yet.
    pub fn is_default(&self) -> bool {
        self.sample_size == 0
    }

    /// Render the guide as prompt instructions. `None` for the default guide.
    pub fn to_prompt_section(&self) -> Option<String> {
        if self.is_default() {
            return None;
        }

        let mut lines = vec![format!(
            "- Aim for about {} words (average of {} approved summaries).",
            self.average_word_count.round() as usize,
            self.sample_size
        )];

        if self.structure != SentenceStructure::Unspecified {
            lines.push(format!("- Preferred structure: {}.", self.structure.describe()));
        }

        if !self.common_openers.is_empty() {
            let openers: Vec<String> = self
                .common_openers
                .iter()
                .map(|o| format!("\"{}\"", o))
                .collect();
            lines.push(format!("- Approved summaries often begin sentences with {}.", openers.join(", ")));
        }

        if self.prefers_concise {
            lines.push("- Reviewers tend to shorten drafts; keep it tight.".to_string());
        }

        Some(lines.join("\n"))
    }
}

/// An accepted summary used as a few-shot example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    pub hotel_id: String,
    pub hotel_name: String,
    pub summary: String,
    pub flag_count: usize,
    pub reviewed_at: DateTime<Utc>,
}

/// Where an error pattern was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// A critique or pipeline flag carried by rejected drafts.
    Flag,
    /// A reason given by the reviewer when rejecting.
    Reason,
}

/// A recurring cause of rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPattern {
    pub category: String,
    pub kind: PatternKind,
    /// Rejections exhibiting the pattern.
    pub count: usize,
    /// `count` over all rejections.
    pub share: f64,
    /// Draft of the earliest rejection exhibiting the pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    /// Prompt guidance derived from the pattern, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
}

/// Direction of a learned word-level edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditAction {
    /// Reviewers add this word.
    Prefer,
    /// Reviewers remove this word.
    Avoid,
}

/// A word reviewers consistently add or remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRule {
    pub word: String,
    pub action: EditAction,
    pub occurrences: usize,
}

/// Everything the learning store has derived from history.
///
/// Replaced whole on every rebuild.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LearningState {
    pub style_guide: StyleGuide,
    pub exemplars: Vec<Exemplar>,
    /// Keyed by category, most frequent first.
    pub error_patterns: IndexMap<String, ErrorPattern>,
    pub edit_rules: Vec<EditRule>,
    /// History length this state was built from.
    pub built_from: usize,
}

impl LearningState {
    /// True when nothing has been learned yet.
    pub fn is_empty(&self) -> bool {
        self.built_from == 0
    }

    /// Guidance lines for prompts: error patterns first, then word preferences.
    pub fn guidance(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .error_patterns
            .values()
            .filter_map(|p| p.guidance.clone())
            .collect();

        for action in [EditAction::Prefer, EditAction::Avoid] {
            let words: Vec<&str> = self
                .edit_rules
                .iter()
                .filter(|r| r.action == action)
                .map(|r| r.word.as_str())
                .collect();
            if words.is_empty() {
                continue;
            }
            let verb = match action {
                EditAction::Prefer => "reviewers often add",
                EditAction::Avoid => "reviewers often remove",
            };
            lines.push(format!("{}: {}", verb, words.join(", ")));
        }

        lines
    }
}
