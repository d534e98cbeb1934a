//! Generator trait and shared types.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::input::HotelRecord;
use crate::learning::{Exemplar, LearningState, StyleGuide};

/// Configuration for LLM providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model to use (e.g., "gpt-4o-mini").
    pub model: String,

    /// Maximum tokens in response.
    pub max_tokens: usize,

    /// Temperature for generation (0.0-1.0).
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 400,
            temperature: 0.3,
        }
    }
}

impl LlmConfig {
    /// Same settings with a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Learned context passed to every generation call.
#[derive(Debug, Clone)]
pub struct PromptHints<'a> {
    pub style_guide: &'a StyleGuide,
    pub exemplars: &'a [Exemplar],
    /// Error-pattern guidance and learned word preferences.
    pub guidance: Vec<String>,
}

impl<'a> PromptHints<'a> {
    /// Hints drawn from the current learned state.
    pub fn from_state(state: &'a LearningState) -> Self {
        Self {
            style_guide: &state.style_guide,
            exemplars: &state.exemplars,
            guidance: state.guidance(),
        }
    }

    /// The simplified hints used when retrying a failed draft.
    pub fn without_exemplars(&self) -> Self {
        Self {
            style_guide: self.style_guide,
            exemplars: &[],
            guidance: self.guidance.clone(),
        }
    }

    /// True when no learned context is present.
    pub fn is_empty(&self) -> bool {
        self.style_guide.is_default() && self.exemplars.is_empty() && self.guidance.is_empty()
    }
}

/// Produces draft summaries.
///
/// Implementations must be thread-safe (Send + Sync) so a pipeline can be
/// moved to a worker thread. An empty string is a valid response; the
/// pipeline treats it like a failure and retries.
pub trait SummaryGenerator: Send + Sync {
    /// Draft a summary for `record` conditioned on `hints`.
    fn generate(&self, record: &HotelRecord, hints: &PromptHints<'_>) -> Result<String>;

    /// Get the configuration for this provider.
    fn config(&self) -> &LlmConfig;

    /// Get the name of this provider (for logging/debugging).
    fn name(&self) -> &str;
}

impl<G: SummaryGenerator + ?Sized> SummaryGenerator for Box<G> {
    fn generate(&self, record: &HotelRecord, hints: &PromptHints<'_>) -> Result<String> {
        (**self).generate(record, hints)
    }

    fn config(&self) -> &LlmConfig {
        (**self).config()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
