//! The learning store: history plus the current learned state.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::analyzer::{FeedbackAnalyzer, HeuristicAnalyzer};
use super::history::FeedbackRecord;
use super::state::LearningState;
use crate::review::{ReviewItem, ReviewOutcome};

/// Tuning for what a rebuild extracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Maximum exemplars passed to the generator.
    pub exemplar_count: usize,
    /// Maximum sentence openers kept in the style guide.
    pub opener_count: usize,
    /// Maximum learned edit rules.
    pub edit_rule_limit: usize,
    /// Shortest word considered by edit rules.
    pub min_edit_word_len: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            exemplar_count: 3,
            opener_count: 3,
            edit_rule_limit: 10,
            min_edit_word_len: 5,
        }
    }
}

impl LearningConfig {
    pub fn with_exemplar_count(mut self, count: usize) -> Self {
        self.exemplar_count = count;
        self
    }

    pub fn with_opener_count(mut self, count: usize) -> Self {
        self.opener_count = count;
        self
    }

    pub fn with_edit_rule_limit(mut self, limit: usize) -> Self {
        self.edit_rule_limit = limit;
        self
    }
}

/// Summary counts for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStatus {
    pub analyzer: String,
    pub history_len: usize,
    pub accepted: usize,
    pub edited: usize,
    pub rejected: usize,
    pub rebuilds: usize,
    /// A rebuild has produced learned hints.
    pub active: bool,
    /// History length the current state reflects.
    pub built_from: usize,
    pub exemplars: usize,
    pub error_patterns: usize,
    pub edit_rules: usize,
}

impl LearningStatus {
    /// Outcomes recorded since the last rebuild.
    pub fn unlearned(&self) -> usize {
        self.history_len.saturating_sub(self.built_from)
    }
}

/// Accumulates review outcomes and rebuilds learned artifacts from them.
pub struct LearningStore {
    config: LearningConfig,
    analyzer: Box<dyn FeedbackAnalyzer>,
    history: Vec<FeedbackRecord>,
    state: LearningState,
    rebuilds: usize,
}

impl fmt::Debug for LearningStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LearningStore")
            .field("analyzer", &self.analyzer.name())
            .field("history", &self.history.len())
            .field("built_from", &self.state.built_from)
            .field("rebuilds", &self.rebuilds)
            .finish()
    }
}

impl Default for LearningStore {
    fn default() -> Self {
        Self::new(LearningConfig::default())
    }
}

impl LearningStore {
    /// Create an empty store using the heuristic analyzer.
    pub fn new(config: LearningConfig) -> Self {
        Self {
            config,
            analyzer: Box::new(HeuristicAnalyzer::new()),
            history: Vec::new(),
            state: LearningState::default(),
            rebuilds: 0,
        }
    }

    /// Replace the extraction limits. History and state are kept.
    pub fn with_config(mut self, config: LearningConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the analyzer used by [`rebuild`](Self::rebuild).
    pub fn with_analyzer(mut self, analyzer: impl FeedbackAnalyzer + 'static) -> Self {
        self.analyzer = Box::new(analyzer);
        self
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Append a decided item to the history. Undecided items are ignored.
    pub fn record(&mut self, item: &ReviewItem) {
        match FeedbackRecord::from_item(item, self.history.len() as u64) {
            Some(record) => {
                debug!(
                    hotel_id = %record.hotel_id,
                    outcome = record.outcome.label(),
                    "Recorded review outcome"
                );
                self.history.push(record);
            }
            None => warn!(
                hotel_id = %item.record.id,
                status = item.status.label(),
                "Ignoring undecided item"
            ),
        }
    }

    /// Recompute the learned state from the full history.
    ///
    /// Running it twice without new outcomes yields an identical state.
    pub fn rebuild(&mut self) -> &LearningState {
        self.state = self.analyzer.analyze(&self.history, &self.config);
        self.rebuilds += 1;
        debug!(
            analyzer = self.analyzer.name(),
            built_from = self.state.built_from,
            exemplars = self.state.exemplars.len(),
            patterns = self.state.error_patterns.len(),
            "Rebuilt learning state"
        );
        &self.state
    }

    /// The current learned state.
    pub fn state(&self) -> &LearningState {
        &self.state
    }

    /// All recorded outcomes, oldest first.
    pub fn history(&self) -> &[FeedbackRecord] {
        &self.history
    }

    /// Number of rebuilds behind the current state, including those restored
    /// from a checkpoint.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Restore history, state and rebuild count saved in a checkpoint.
    pub fn restore(&mut self, history: Vec<FeedbackRecord>, state: LearningState, rebuilds: usize) {
        self.history = history;
        self.state = state;
        self.rebuilds = rebuilds;
    }

    /// Counts for display.
    pub fn status(&self) -> LearningStatus {
        let count = |outcome: ReviewOutcome| {
            self.history
                .iter()
                .filter(|r| r.outcome == outcome)
                .count()
        };

        LearningStatus {
            analyzer: self.analyzer.name().to_string(),
            history_len: self.history.len(),
            accepted: count(ReviewOutcome::Accepted),
            edited: count(ReviewOutcome::Edited),
            rejected: count(ReviewOutcome::Rejected),
            rebuilds: self.rebuilds,
            active: !self.state.is_empty(),
            built_from: self.state.built_from,
            exemplars: self.state.exemplars.len(),
            error_patterns: self.state.error_patterns.len(),
            edit_rules: self.state.edit_rules.len(),
        }
    }
}
