//! Rule checks for draft summaries.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::input::{HotelRecord, QualityAttribute};

use super::flags::{CritiqueFlag, FlagSet};

/// Decimal or integer numbers, e.g. "8", "8.7".
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Sentence terminators. A period inside "8.7" is not followed by whitespace.
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+(?:\s+|$)").unwrap());

/// Engine used by [`critique`].
static DEFAULT_ENGINE: Lazy<CritiqueEngine> = Lazy::new(CritiqueEngine::default);

/// Word forms accepted for star ratings, indexed by rating.
const RATING_WORDS: [&str; 6] = ["zero", "one", "two", "three", "four", "five"];

/// Marketing terms that need a number in the same sentence.
const DEFAULT_SUPERLATIVES: &[&str] = &[
    "amazing",
    "best",
    "breathtaking",
    "exceptional",
    "finest",
    "incredible",
    "magnificent",
    "perfect",
    "spectacular",
    "stunning",
    "ultimate",
    "unbeatable",
    "unforgettable",
    "unparalleled",
    "world-class",
];

/// Limits applied by the critique engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiqueConfig {
    /// Minimum word count (inclusive).
    pub min_words: usize,
    /// Maximum word count (inclusive).
    pub max_words: usize,
    /// Minimum distinct scored attributes referenced.
    pub min_attributes: usize,
    /// Maximum distinct scored attributes referenced.
    pub max_attributes: usize,
    /// Lowercase superlative terms.
    pub superlatives: Vec<String>,
}

impl Default for CritiqueConfig {
    fn default() -> Self {
        Self {
            min_words: 60,
            max_words: 100,
            min_attributes: 2,
            max_attributes: 4,
            superlatives: DEFAULT_SUPERLATIVES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Detailed result of critiquing one summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiqueReport {
    /// Flags raised.
    pub flags: FlagSet,
    /// Whitespace-separated word count.
    pub word_count: usize,
    /// Whether the city or country appears.
    pub location_mentioned: bool,
    /// Whether the star rating appears.
    pub rating_mentioned: bool,
    /// Distinct scored attributes referenced, in attribute order.
    pub attributes: Vec<QualityAttribute>,
    /// Superlatives found in sentences without numbers.
    pub superlatives: Vec<String>,
}

impl CritiqueReport {
    /// True if no flags were raised.
    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }

    /// One explanatory line per flag, for the reviewer.
    pub fn notes(&self, config: &CritiqueConfig) -> Vec<String> {
        self.flags
            .iter()
            .map(|flag| match flag {
                CritiqueFlag::WordCountOutOfRange => format!(
                    "Word count {} (expected {}-{})",
                    self.word_count, config.min_words, config.max_words
                ),
                CritiqueFlag::LocationMissing => "Location not clearly mentioned".to_string(),
                CritiqueFlag::RatingMissing => "Star rating not mentioned".to_string(),
                CritiqueFlag::AmenityCountInvalid => format!(
                    "{} scored attributes mentioned (expected {}-{})",
                    self.attributes.len(),
                    config.min_attributes,
                    config.max_attributes
                ),
                CritiqueFlag::VagueSuperlative => format!(
                    "Contains unsupported superlatives: {}",
                    self.superlatives.join(", ")
                ),
                other => other.label().to_string(),
            })
            .collect()
    }
}

/// Checks summaries against their source record. Pure and deterministic.
#[derive(Debug, Clone, Default)]
pub struct CritiqueEngine {
    config: CritiqueConfig,
}

impl CritiqueEngine {
    /// Create an engine with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom limits.
    pub fn with_config(config: CritiqueConfig) -> Self {
        Self { config }
    }

    /// The engine's limits.
    pub fn config(&self) -> &CritiqueConfig {
        &self.config
    }

    /// Flags for a summary. Equivalent to `evaluate(..).flags`.
    pub fn critique(&self, summary: &str, record: &HotelRecord) -> FlagSet {
        self.evaluate(summary, record).flags
    }

    /// Run every check; none short-circuits another.
    pub fn evaluate(&self, summary: &str, record: &HotelRecord) -> CritiqueReport {
        let words = words(summary);
        let numbers = numbers(summary);
        let word_count = summary.split_whitespace().count();

        let location_mentioned = mentions_location(summary, record);
        let rating_mentioned = mentions_rating(&words, &numbers, record);
        let attributes = referenced_attributes(&words, &numbers, record);
        let superlatives = self.unsupported_superlatives(summary);

        let mut flags = FlagSet::new();
        if word_count < self.config.min_words || word_count > self.config.max_words {
            flags.insert(CritiqueFlag::WordCountOutOfRange);
        }
        if !location_mentioned {
            flags.insert(CritiqueFlag::LocationMissing);
        }
        if !rating_mentioned {
            flags.insert(CritiqueFlag::RatingMissing);
        }
        if attributes.len() < self.config.min_attributes
            || attributes.len() > self.config.max_attributes
        {
            flags.insert(CritiqueFlag::AmenityCountInvalid);
        }
        if !superlatives.is_empty() {
            flags.insert(CritiqueFlag::VagueSuperlative);
        }

        CritiqueReport {
            flags,
            word_count,
            location_mentioned,
            rating_mentioned,
            attributes,
            superlatives,
        }
    }

    fn unsupported_superlatives(&self, summary: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();

        for sentence in SENTENCE_END.split(summary) {
            if NUMBER.is_match(sentence) {
                continue;
            }
            for word in words(sentence) {
                let hit = self.config.superlatives.iter().find(|term| {
                    word == **term || word.split('-').any(|part| part == term.as_str())
                });
                if let Some(term) = hit {
                    if !found.contains(term) {
                        found.push(term.clone());
                    }
                }
            }
        }

        found
    }
}

/// Critique with the default limits.
pub fn critique(summary: &str, record: &HotelRecord) -> FlagSet {
    DEFAULT_ENGINE.critique(summary, record)
}

/// Lowercase words with surrounding punctuation removed. Inner hyphens stay.
fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn numbers(text: &str) -> Vec<&str> {
    NUMBER.find_iter(text).map(|m| m.as_str()).collect()
}

fn mentions_location(summary: &str, record: &HotelRecord) -> bool {
    let lower = summary.to_lowercase();
    [record.city(), record.country()]
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .any(|needle| !needle.is_empty() && lower.contains(&needle))
}

fn mentions_rating(words: &[String], numbers: &[&str], record: &HotelRecord) -> bool {
    let Some(rating) = record.star_rating else {
        return false;
    };

    let as_digit = rating.to_string();
    if numbers.iter().any(|n| *n == as_digit) {
        return true;
    }

    match RATING_WORDS.get(rating as usize) {
        Some(word) => words
            .iter()
            .any(|w| w == word || w.split('-').any(|part| part == *word)),
        None => false,
    }
}

fn referenced_attributes(
    words: &[String],
    numbers: &[&str],
    record: &HotelRecord,
) -> Vec<QualityAttribute> {
    let values: Vec<f64> = numbers.iter().filter_map(|n| n.parse().ok()).collect();

    QualityAttribute::ALL
        .into_iter()
        .filter(|attr| {
            let by_name = words.iter().any(|w| {
                w.split('-')
                    .any(|part| attr.stems().iter().any(|stem| part.starts_with(stem)))
            });
            let by_value = record
                .scores
                .get(*attr)
                .is_some_and(|score| values.iter().any(|v| (v - score).abs() < 1e-9));
            by_name || by_value
        })
        .collect()
}
