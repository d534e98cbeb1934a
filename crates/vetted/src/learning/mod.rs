//! Adaptive learning from review outcomes.
//!
//! Every terminal review outcome is appended to the store's history. Every few
//! completed reviews the pipeline asks the store to rebuild its
//! [`LearningState`] from scratch; the new state replaces the old one whole and
//! conditions the prompts of later drafts.
//!
//! The statistics behind a rebuild live behind the [`FeedbackAnalyzer`] trait so
//! they can change without touching the pipeline.

mod analyzer;
mod history;
mod state;
mod store;

pub use analyzer::{FeedbackAnalyzer, HeuristicAnalyzer};
pub use history::FeedbackRecord;
pub use state::{
    EditAction, EditRule, ErrorPattern, Exemplar, LearningState, PatternKind, SentenceStructure,
    StyleGuide,
};
pub use store::{LearningConfig, LearningStatus, LearningStore};
