//! Mock generator for testing and offline runs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Result, VettedError};
use crate::input::HotelRecord;
use crate::learning::{Exemplar, StyleGuide};

use super::provider::{LlmConfig, PromptHints, SummaryGenerator};

/// Word count the template summary is padded to.
const TARGET_WORDS: usize = 65;

/// Neutral sentences used to pad template summaries.
const FILLER: &[&str] = &[
    "The hotel offers a practical base for travellers planning to explore the surrounding area.",
    "Rooms are arranged for short and longer visits alike, with simple layouts and quiet corridors.",
    "Reception can help with local transport, restaurant bookings and day trips on request.",
    "Recent reviews describe a consistent experience that matches the published ratings.",
    "Breakfast and luggage storage are available, and check-in follows standard hotel hours.",
    "Overall, the data points to a dependable choice for a city stay.",
];

/// A scripted reply.
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    Text(String),
    Empty,
    Error(String),
}

/// Arguments of one `generate` call, captured for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub hotel_id: String,
    pub style_guide: StyleGuide,
    pub exemplars: Vec<Exemplar>,
    pub guidance: Vec<String>,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<RecordedCall>,
    script: VecDeque<MockResponse>,
}

/// Generator that returns deterministic template summaries.
///
/// Clones share the same call log and script, so a test can keep a handle
/// after moving the generator into a pipeline. Scripted responses are used
/// first, in order; once exhausted the template takes over.
#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    config: LlmConfig,
    state: Arc<Mutex<MockState>>,
}

impl MockGenerator {
    /// Create a new mock generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration.
    pub fn with_config(config: LlmConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Queue scripted responses.
    pub fn with_responses(self, responses: impl IntoIterator<Item = MockResponse>) -> Self {
        self.lock().script.extend(responses);
        self
    }

    /// Queue one scripted response.
    pub fn push_response(&self, response: MockResponse) {
        self.lock().script.push_back(response);
    }

    /// All calls so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Calls made for one hotel.
    pub fn calls_for(&self, hotel_id: &str) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.hotel_id == hotel_id)
            .cloned()
            .collect()
    }

    /// The summary returned when no scripted response is queued.
    pub fn template_summary(record: &HotelRecord) -> String {
        let location = record
            .location
            .as_ref()
            .map(|l| l.display())
            .filter(|l| !l.is_empty());

        let mut opening = format!("{} is a", record.name);
        if let Some(rating) = record.star_rating {
            opening.push_str(&format!(" {}-star", rating));
        }
        opening.push_str(" hotel");
        if let Some(location) = location {
            opening.push_str(&format!(" in {}", location));
        }
        opening.push('.');

        let mut sentences = vec![opening];

        let ranked = record.scores.ranked();
        let mentions: Vec<String> = ranked
            .iter()
            .take(2)
            .map(|(attr, score)| format!("{} at {:.1}", attr, score))
            .collect();
        if !mentions.is_empty() {
            sentences.push(format!("Guests rate {} out of ten.", mentions.join(" and ")));
        }

        let mut words: usize = sentences.iter().map(|s| s.split_whitespace().count()).sum();
        for filler in FILLER {
            if words >= TARGET_WORDS {
                break;
            }
            sentences.push((*filler).to_string());
            words += filler.split_whitespace().count();
        }

        sentences.join(" ")
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the log from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SummaryGenerator for MockGenerator {
    fn generate(&self, record: &HotelRecord, hints: &PromptHints<'_>) -> Result<String> {
        let scripted = {
            let mut state = self.lock();
            state.calls.push(RecordedCall {
                hotel_id: record.id.clone(),
                style_guide: hints.style_guide.clone(),
                exemplars: hints.exemplars.to_vec(),
                guidance: hints.guidance.clone(),
            });
            state.script.pop_front()
        };

        match scripted {
            Some(MockResponse::Text(text)) => Ok(text),
            Some(MockResponse::Empty) => Ok(String::new()),
            Some(MockResponse::Error(message)) => Err(VettedError::Provider(message)),
            None => Ok(Self::template_summary(record)),
        }
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critique::critique;
    use crate::input::{Location, QualityAttribute, QualityScores};
    use crate::learning::LearningState;

    fn record() -> HotelRecord {
        HotelRecord::new("h1", "Hotel Lumen")
            .with_location(Location::new("Lisbon", "Portugal"))
            .with_star_rating(4)
            .with_scores(
                QualityScores::new()
                    .with(QualityAttribute::Cleanliness, 8.7)
                    .with(QualityAttribute::Comfort, 8.2)
                    .with(QualityAttribute::Staff, 9.1)
                    .with(QualityAttribute::Value, 7.4),
            )
    }

    #[test]
    fn test_template_passes_critique() {
        let summary = MockGenerator::template_summary(&record());
        let words = summary.split_whitespace().count();
        assert!((60..=100).contains(&words), "{} words", words);
        assert!(critique(&summary, &record()).is_empty(), "{}", summary);
    }

    #[test]
    fn test_template_is_deterministic() {
        assert_eq!(
            MockGenerator::template_summary(&record()),
            MockGenerator::template_summary(&record())
        );
    }

    #[test]
    fn test_scripted_responses_then_template() {
        let generator = MockGenerator::new().with_responses([
            MockResponse::Empty,
            MockResponse::Error("rate limited".to_string()),
            MockResponse::Text("Scripted.".to_string()),
        ]);
        let state = LearningState::default();
        let hints = PromptHints::from_state(&state);

        assert_eq!(generator.generate(&record(), &hints).unwrap(), "");
        assert!(matches!(
            generator.generate(&record(), &hints),
            Err(VettedError::Provider(_))
        ));
        assert_eq!(generator.generate(&record(), &hints).unwrap(), "Scripted.");
        assert!(generator.generate(&record(), &hints).unwrap().starts_with("Hotel Lumen"));
        assert_eq!(generator.call_count(), 4);
    }

    #[test]
    fn test_clones_share_call_log() {
        let generator = MockGenerator::new();
        let handle = generator.clone();
        let state = LearningState::default();

        generator
            .generate(&record(), &PromptHints::from_state(&state))
            .unwrap();

        let calls = handle.calls_for("h1");
        assert_eq!(calls.len(), 1);
        assert!(calls[0].style_guide.is_default());
        assert!(calls[0].exemplars.is_empty());
    }
}
