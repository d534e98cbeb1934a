//! Turning review history into a [`LearningState`].

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::history::FeedbackRecord;
use super::state::{
    EditAction, EditRule, ErrorPattern, Exemplar, LearningState, PatternKind, SentenceStructure,
    StyleGuide,
};
use super::store::LearningConfig;
use crate::critique::CritiqueFlag;
use crate::review::ReviewOutcome;

static RATING_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:[1-5]|one|two|three|four|five)[\s-]*stars?\b").unwrap()
});

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+(?:\s+|$)").unwrap());

/// Derives learned artifacts from review history.
///
/// Implementations must be pure: the same history and config always produce
/// the same state.
pub trait FeedbackAnalyzer: Send + Sync {
    /// Build a fresh state from the full history.
    fn analyze(&self, history: &[FeedbackRecord], config: &LearningConfig) -> LearningState;

    /// Name used in logs.
    fn name(&self) -> &str;
}

/// Counting-based analyzer used by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalyzer;

impl HeuristicAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Style statistics over accepted and edited summaries.
    pub fn style_guide(&self, history: &[FeedbackRecord], config: &LearningConfig) -> StyleGuide {
        let approved: Vec<(&FeedbackRecord, &str)> = history
            .iter()
            .filter_map(|r| r.approved_summary().map(|s| (r, s)))
            .collect();

        if approved.is_empty() {
            return StyleGuide::default();
        }

        let total_words: usize = approved.iter().map(|(_, s)| word_count(s)).sum();
        let average_word_count = total_words as f64 / approved.len() as f64;

        let mut structure_counts: BTreeMap<SentenceStructure, usize> = BTreeMap::new();
        for (record, summary) in &approved {
            let structure = classify_structure(summary, record);
            if structure != SentenceStructure::Unspecified {
                *structure_counts.entry(structure).or_default() += 1;
            }
        }
        let mut structure = SentenceStructure::Unspecified;
        let mut best = 0;
        for candidate in SentenceStructure::CLASSIFIED {
            let count = structure_counts.get(&candidate).copied().unwrap_or(0);
            if count > best {
                best = count;
                structure = candidate;
            }
        }

        let mut opener_counts: BTreeMap<String, usize> = BTreeMap::new();
        for (_, summary) in &approved {
            for opener in sentence_openers(summary) {
                *opener_counts.entry(opener).or_default() += 1;
            }
        }
        let mut openers: Vec<(String, usize)> =
            opener_counts.into_iter().filter(|(_, n)| *n >= 2).collect();
        openers.sort_by_key(|(opener, n)| (Reverse(*n), opener.clone()));
        let common_openers = openers
            .into_iter()
            .take(config.opener_count)
            .map(|(opener, _)| opener)
            .collect();

        let edited: Vec<&FeedbackRecord> = approved
            .iter()
            .map(|(r, _)| *r)
            .filter(|r| r.outcome == ReviewOutcome::Edited)
            .collect();
        let edited_share = edited.len() as f64 / approved.len() as f64;

        let (draft_words, final_words) = edited
            .iter()
            .filter_map(|r| Some((r.draft_summary.as_deref()?, r.final_summary.as_deref()?)))
            .fold((0usize, 0usize), |(d, f), (draft, fin)| {
                (d + word_count(draft), f + word_count(fin))
            });
        let prefers_concise = final_words < draft_words;

        StyleGuide {
            sample_size: approved.len(),
            average_word_count,
            structure,
            common_openers,
            edited_share,
            prefers_concise,
        }
    }

    /// Up to `exemplar_count` accepted summaries: unflagged first, then most recent.
    pub fn exemplars(&self, history: &[FeedbackRecord], config: &LearningConfig) -> Vec<Exemplar> {
        let mut accepted: Vec<&FeedbackRecord> = history
            .iter()
            .filter(|r| r.outcome == ReviewOutcome::Accepted && r.final_summary.is_some())
            .collect();

        accepted.sort_by_key(|r| (!r.flags.is_empty(), Reverse(r.reviewed_at), r.sequence));

        accepted
            .into_iter()
            .take(config.exemplar_count)
            .filter_map(|r| {
                Some(Exemplar {
                    hotel_id: r.hotel_id.clone(),
                    hotel_name: r.hotel_name.clone(),
                    summary: r.final_summary.clone()?,
                    flag_count: r.flags.len(),
                    reviewed_at: r.reviewed_at,
                })
            })
            .collect()
    }

    /// Flag and reason frequencies across rejections, most frequent first.
    pub fn error_patterns(&self, history: &[FeedbackRecord]) -> IndexMap<String, ErrorPattern> {
        let rejected: Vec<&FeedbackRecord> = history
            .iter()
            .filter(|r| r.outcome == ReviewOutcome::Rejected)
            .collect();

        if rejected.is_empty() {
            return IndexMap::new();
        }

        // category -> (kind, count, earliest example)
        let mut tallies: BTreeMap<String, (PatternKind, usize, Option<String>)> = BTreeMap::new();
        for record in &rejected {
            let mut categories: Vec<(String, PatternKind)> = record
                .flags
                .iter()
                .map(|f| (f.as_str().to_string(), PatternKind::Flag))
                .collect();
            if let Some(reason) = record.rejection_reason.as_deref() {
                let reason = normalize_reason(reason);
                if !reason.is_empty() && !categories.iter().any(|(c, _)| *c == reason) {
                    categories.push((reason, PatternKind::Reason));
                }
            }

            for (category, kind) in categories {
                let entry = tallies.entry(category).or_insert((kind, 0, None));
                entry.1 += 1;
                if entry.2.is_none() {
                    entry.2 = record.draft_summary.clone();
                }
            }
        }

        let total = rejected.len();
        let mut patterns: Vec<ErrorPattern> = tallies
            .into_iter()
            .map(|(category, (kind, count, example))| {
                let share = count as f64 / total as f64;
                let guidance = pattern_guidance(&category, kind, count, share, total);
                ErrorPattern {
                    category,
                    kind,
                    count,
                    share,
                    example,
                    guidance,
                }
            })
            .collect();

        patterns.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
        patterns
            .into_iter()
            .map(|p| (p.category.clone(), p))
            .collect()
    }

    /// Words reviewers consistently remove from or add to drafts.
    pub fn edit_rules(&self, history: &[FeedbackRecord], config: &LearningConfig) -> Vec<EditRule> {
        let mut counts: BTreeMap<(EditAction, String), usize> = BTreeMap::new();

        for record in history.iter().filter(|r| r.outcome == ReviewOutcome::Edited) {
            let (Some(draft), Some(edited)) =
                (record.draft_summary.as_deref(), record.final_summary.as_deref())
            else {
                continue;
            };

            let before = significant_words(draft, config.min_edit_word_len);
            let after = significant_words(edited, config.min_edit_word_len);

            for word in before.difference(&after) {
                *counts.entry((EditAction::Avoid, word.clone())).or_default() += 1;
            }
            for word in after.difference(&before) {
                *counts.entry((EditAction::Prefer, word.clone())).or_default() += 1;
            }
        }

        let mut rules: Vec<EditRule> = counts
            .into_iter()
            .map(|((action, word), occurrences)| EditRule {
                word,
                action,
                occurrences,
            })
            .collect();

        rules.sort_by(|a, b| {
            b.occurrences
                .cmp(&a.occurrences)
                .then_with(|| a.action.cmp(&b.action))
                .then_with(|| a.word.cmp(&b.word))
        });
        rules.truncate(config.edit_rule_limit);
        rules
    }
}

impl FeedbackAnalyzer for HeuristicAnalyzer {
    fn analyze(&self, history: &[FeedbackRecord], config: &LearningConfig) -> LearningState {
        LearningState {
            style_guide: self.style_guide(history, config),
            exemplars: self.exemplars(history, config),
            error_patterns: self.error_patterns(history),
            edit_rules: self.edit_rules(history, config),
            built_from: history.len(),
        }
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

fn pattern_guidance(
    category: &str,
    kind: PatternKind,
    count: usize,
    share: f64,
    total: usize,
) -> Option<String> {
    match kind {
        PatternKind::Flag => {
            let flag: CritiqueFlag = category.parse().ok()?;
            flag.guidance().map(|g| {
                format!("{}: flagged in {:.0}% of rejections", g, share * 100.0)
            })
        }
        PatternKind::Reason => Some(format!(
            "reviewers rejected drafts as \"{}\" ({} of {} rejections)",
            category, count, total
        )),
    }
}

fn normalize_reason(reason: &str) -> String {
    reason
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn significant_words(text: &str, min_len: usize) -> BTreeSet<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| w.chars().count() >= min_len && w.chars().all(char::is_alphabetic))
        .collect()
}

fn sentence_openers(text: &str) -> Vec<String> {
    SENTENCE_END
        .split(text)
        .filter_map(|sentence| {
            let words: Vec<String> = sentence
                .split_whitespace()
                .take(2)
                .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
                .filter(|w| !w.is_empty())
                .collect();
            (words.len() == 2).then(|| words.join(" "))
        })
        .collect()
}

/// Which element appears first in the summary.
fn classify_structure(summary: &str, record: &FeedbackRecord) -> SentenceStructure {
    let lower = summary.to_lowercase();
    let position = |needle: &str| {
        if needle.trim().is_empty() {
            None
        } else {
            lower.find(&needle.to_lowercase())
        }
    };

    let name = position(&record.hotel_name);
    let location = [position(&record.city), position(&record.country)]
        .into_iter()
        .flatten()
        .min();
    let rating = RATING_PHRASE.find(summary).map(|m| m.start());

    let mut first: Option<(usize, SentenceStructure)> = None;
    for (pos, structure) in [
        (name, SentenceStructure::NameFirst),
        (location, SentenceStructure::LocationFirst),
        (rating, SentenceStructure::RatingFirst),
    ] {
        let Some(pos) = pos else { continue };
        if first.map_or(true, |(best, _)| pos < best) {
            first = Some((pos, structure));
        }
    }

    first.map(|(_, s)| s).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critique::FlagSet;
    use chrono::{TimeZone, Utc};

    fn feedback(seq: u64, outcome: ReviewOutcome) -> FeedbackRecord {
        FeedbackRecord {
            sequence: seq,
            hotel_id: format!("h{}", seq),
            hotel_name: format!("Hotel {}", seq),
            city: "Porto".to_string(),
            country: "Portugal".to_string(),
            star_rating: Some(4),
            outcome,
            draft_summary: Some(format!("Hotel {} is a 4 star hotel in Porto.", seq)),
            final_summary: match outcome {
                ReviewOutcome::Rejected => None,
                _ => Some(format!("Hotel {} is a 4 star hotel in Porto.", seq)),
            },
            flags: FlagSet::new(),
            rejection_reason: None,
            reviewed_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, seq as u32).unwrap(),
        }
    }

    #[test]
    fn test_empty_history_gives_default_state() {
        let state = HeuristicAnalyzer::new().analyze(&[], &LearningConfig::default());
        assert_eq!(state, LearningState::default());
    }

    #[test]
    fn test_style_guide_statistics() {
        let history = vec![
            feedback(0, ReviewOutcome::Accepted),
            feedback(1, ReviewOutcome::Accepted),
            feedback(2, ReviewOutcome::Rejected),
        ];

        let guide = HeuristicAnalyzer.style_guide(&history, &LearningConfig::default());
        assert_eq!(guide.sample_size, 2);
        assert_eq!(guide.average_word_count, 9.0);
        assert_eq!(guide.structure, SentenceStructure::NameFirst);
        assert_eq!(guide.edited_share, 0.0);
        assert!(!guide.prefers_concise);
        assert!(!guide.is_default());
    }

    #[test]
    fn test_common_openers_need_repetition() {
        let mut a = feedback(0, ReviewOutcome::Accepted);
        a.final_summary = Some("Guests praise the staff. Rooms are quiet.".to_string());
        let mut b = feedback(1, ReviewOutcome::Accepted);
        b.final_summary = Some("Guests praise the views. Breakfast is fine.".to_string());

        let guide = HeuristicAnalyzer.style_guide(&[a, b], &LearningConfig::default());
        assert_eq!(guide.common_openers, vec!["guests praise".to_string()]);
    }

    #[test]
    fn test_structure_location_first() {
        let mut record = feedback(0, ReviewOutcome::Accepted);
        record.final_summary = Some("In Porto, Hotel 0 offers 4 star comfort.".to_string());
        assert_eq!(
            classify_structure(record.final_summary.as_deref().unwrap(), &record),
            SentenceStructure::LocationFirst
        );

        record.final_summary = Some("A four-star stay: Hotel 0 in Porto.".to_string());
        assert_eq!(
            classify_structure(record.final_summary.as_deref().unwrap(), &record),
            SentenceStructure::RatingFirst
        );
    }

    #[test]
    fn test_exemplars_prefer_fewest_flags_then_recent() {
        let mut flagged = feedback(0, ReviewOutcome::Accepted);
        flagged.flags.insert(CritiqueFlag::VagueSuperlative);
        let older = feedback(1, ReviewOutcome::Accepted);
        let newer = feedback(2, ReviewOutcome::Accepted);
        let edited = feedback(3, ReviewOutcome::Edited);
        let history = vec![flagged, older, newer, edited];

        let config = LearningConfig::default().with_exemplar_count(2);
        let exemplars = HeuristicAnalyzer.exemplars(&history, &config);
        let ids: Vec<&str> = exemplars.iter().map(|e| e.hotel_id.as_str()).collect();
        assert_eq!(ids, vec!["h2", "h1"]);
    }

    #[test]
    fn test_flag_count_does_not_rank_flagged_exemplars() {
        let mut one_flag = feedback(0, ReviewOutcome::Accepted);
        one_flag.flags.insert(CritiqueFlag::VagueSuperlative);
        let mut two_flags = feedback(1, ReviewOutcome::Accepted);
        two_flags.flags.insert(CritiqueFlag::VagueSuperlative);
        two_flags.flags.insert(CritiqueFlag::LocationMissing);

        let config = LearningConfig::default().with_exemplar_count(1);
        let exemplars = HeuristicAnalyzer.exemplars(&[one_flag, two_flags], &config);
        assert_eq!(exemplars.len(), 1);
        assert_eq!(exemplars[0].hotel_id, "h1");
        assert_eq!(exemplars[0].flag_count, 2);
    }

    #[test]
    fn test_exemplar_ties_keep_history_order() {
        let mut a = feedback(0, ReviewOutcome::Accepted);
        let mut b = feedback(1, ReviewOutcome::Accepted);
        b.reviewed_at = a.reviewed_at;
        a.hotel_id = "first".to_string();
        b.hotel_id = "second".to_string();

        let exemplars = HeuristicAnalyzer.exemplars(&[b, a], &LearningConfig::default());
        assert_eq!(exemplars[0].hotel_id, "first");
        assert_eq!(exemplars[1].hotel_id, "second");
    }

    #[test]
    fn test_error_patterns_from_flags_and_reasons() {
        let mut a = feedback(0, ReviewOutcome::Rejected);
        a.flags.insert(CritiqueFlag::VagueSuperlative);
        a.rejection_reason = Some("Too salesy".to_string());
        let mut b = feedback(1, ReviewOutcome::Rejected);
        b.flags.insert(CritiqueFlag::VagueSuperlative);
        b.flags.insert(CritiqueFlag::LocationMissing);
        let mut c = feedback(2, ReviewOutcome::Rejected);
        c.flags.insert(CritiqueFlag::DataError);

        let patterns = HeuristicAnalyzer.error_patterns(&[a, b, c]);
        let keys: Vec<&str> = patterns.keys().map(|k| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["vague-superlative", "data-error", "location-missing", "too salesy"]
        );

        let vague = &patterns["vague-superlative"];
        assert_eq!(vague.count, 2);
        assert!((vague.share - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(vague.kind, PatternKind::Flag);
        assert!(vague.guidance.as_deref().unwrap().contains("67% of rejections"));
        assert_eq!(vague.example.as_deref(), Some("Hotel 0 is a 4 star hotel in Porto."));

        assert!(patterns["data-error"].guidance.is_none());

        let reason = &patterns["too salesy"];
        assert_eq!(reason.kind, PatternKind::Reason);
        assert!(reason.guidance.as_deref().unwrap().contains("1 of 3"));
    }

    #[test]
    fn test_edit_rules() {
        let mut a = feedback(0, ReviewOutcome::Edited);
        a.draft_summary = Some("A stunning hotel with lovely gardens.".to_string());
        a.final_summary = Some("A hotel with quiet gardens.".to_string());
        let mut b = feedback(1, ReviewOutcome::Edited);
        b.draft_summary = Some("Truly stunning rooms.".to_string());
        b.final_summary = Some("Quiet rooms.".to_string());

        let rules = HeuristicAnalyzer.edit_rules(&[a, b], &LearningConfig::default());
        assert_eq!(rules[0].word, "quiet");
        assert_eq!(rules[0].action, EditAction::Prefer);
        assert_eq!(rules[0].occurrences, 2);
        assert_eq!(rules[1].word, "stunning");
        assert_eq!(rules[1].action, EditAction::Avoid);
        assert_eq!(rules[1].occurrences, 2);
        // short words never become rules
        assert!(rules.iter().all(|r| r.word != "with"));
        assert!(rules.iter().any(|r| r.word == "lovely"));

        let limited = LearningConfig::default().with_edit_rule_limit(1);
        let mut c = feedback(2, ReviewOutcome::Edited);
        c.draft_summary = Some("stunning".to_string());
        c.final_summary = Some("quiet".to_string());
        assert_eq!(HeuristicAnalyzer.edit_rules(&[c], &limited).len(), 1);
    }

    #[test]
    fn test_prefers_concise() {
        let mut a = feedback(0, ReviewOutcome::Edited);
        a.draft_summary = Some("one two three four five six".to_string());
        a.final_summary = Some("one two three".to_string());

        let guide = HeuristicAnalyzer.style_guide(&[a], &LearningConfig::default());
        assert!(guide.prefers_concise);
        assert_eq!(guide.edited_share, 1.0);
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let history: Vec<FeedbackRecord> = (0..6)
            .map(|i| {
                feedback(
                    i,
                    if i % 3 == 0 {
                        ReviewOutcome::Rejected
                    } else {
                        ReviewOutcome::Accepted
                    },
                )
            })
            .collect();
        let config = LearningConfig::default();
        let first = HeuristicAnalyzer.analyze(&history, &config);
        let second = HeuristicAnalyzer.analyze(&history, &config);
        assert_eq!(first, second);
        assert_eq!(first.built_from, 6);
    }
}
