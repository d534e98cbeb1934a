//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::critique::CritiqueConfig;
use crate::learning::LearningConfig;

/// Number of completed reviews between learning rebuilds.
pub const DEFAULT_LEARNING_INTERVAL: usize = 5;

/// Configuration for a review pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Rebuild learning state after every `learning_interval` terminal transitions.
    pub learning_interval: usize,
    /// Extra generator attempts after an empty or failed draft.
    pub generation_retries: u8,
    /// Self-critique rules.
    pub critique: CritiqueConfig,
    /// Learning heuristics.
    pub learning: LearningConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            learning_interval: DEFAULT_LEARNING_INTERVAL,
            generation_retries: 1,
            critique: CritiqueConfig::default(),
            learning: LearningConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the learning interval. Zero disables automatic rebuilds.
    pub fn with_learning_interval(mut self, interval: usize) -> Self {
        self.learning_interval = interval;
        self
    }

    /// Set the critique configuration.
    pub fn with_critique(mut self, critique: CritiqueConfig) -> Self {
        self.critique = critique;
        self
    }

    /// Set the learning configuration.
    pub fn with_learning(mut self, learning: LearningConfig) -> Self {
        self.learning = learning;
        self
    }

    /// Whether a rebuild is due after `completed` terminal transitions.
    pub fn rebuild_due(&self, completed: usize) -> bool {
        self.learning_interval > 0 && completed > 0 && completed % self.learning_interval == 0
    }

    /// Reviews remaining until the next rebuild.
    pub fn reviews_until_rebuild(&self, completed: usize) -> Option<usize> {
        if self.learning_interval == 0 {
            return None;
        }
        Some(self.learning_interval - completed % self.learning_interval)
    }
}
