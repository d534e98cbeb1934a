//! Integration tests for the learning store as seen through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use vetted::{
    Decision, FeedbackAnalyzer, FeedbackRecord, HotelRecord, LearningConfig, LearningState,
    LearningStore, Location, MemoryPersistence, MockGenerator, PipelineConfig, Progress,
    QualityAttribute, QualityScores, RecordBatch, ReviewItem, ReviewPipeline, ReviewStatus,
    StyleGuide,
};

fn hotel(id: &str) -> HotelRecord {
    HotelRecord::new(id, format!("Hotel {}", id.to_uppercase()))
        .with_location(Location::new("Lisbon", "Portugal"))
        .with_star_rating(4)
        .with_scores(
            QualityScores::new()
                .with(QualityAttribute::Cleanliness, 8.7)
                .with(QualityAttribute::Comfort, 8.2)
                .with(QualityAttribute::Staff, 9.1),
        )
}

/// An item decided by a reviewer, built by walking the state machine.
fn decided(id: &str, draft: &str, decision: Decision) -> ReviewItem {
    let mut item = ReviewItem::new(hotel(id));
    item.draft_summary = Some(draft.to_string());
    item.transition(ReviewStatus::Drafted).unwrap();
    item.transition(ReviewStatus::Critiqued).unwrap();
    item.transition(ReviewStatus::AwaitingHuman).unwrap();

    match decision {
        Decision::Accept => {
            item.transition(ReviewStatus::Accepted).unwrap();
            item.final_summary = Some(draft.to_string());
            item.outcome = Some(vetted::ReviewOutcome::Accepted);
        }
        Decision::Edit { text } => {
            item.transition(ReviewStatus::Edited).unwrap();
            item.final_summary = Some(text);
            item.outcome = Some(vetted::ReviewOutcome::Edited);
        }
        Decision::Reject { reason } => {
            item.transition(ReviewStatus::Rejected).unwrap();
            item.rejection_reason = reason;
            item.outcome = Some(vetted::ReviewOutcome::Rejected);
        }
    }
    item.review_timestamp = Some(chrono::Utc::now());
    item
}

/// Counts calls and reports a fixed target length.
#[derive(Clone, Default)]
struct CountingAnalyzer {
    calls: Arc<AtomicUsize>,
}

impl FeedbackAnalyzer for CountingAnalyzer {
    fn analyze(&self, history: &[FeedbackRecord], _config: &LearningConfig) -> LearningState {
        self.calls.fetch_add(1, Ordering::SeqCst);
        LearningState {
            style_guide: StyleGuide {
                sample_size: history.len(),
                average_word_count: 42.0,
                ..StyleGuide::default()
            },
            built_from: history.len(),
            ..LearningState::default()
        }
    }

    fn name(&self) -> &str {
        "counting"
    }
}

// =============================================================================
// Store
// =============================================================================

#[test]
fn test_rebuild_is_idempotent() {
    let mut store = LearningStore::default();
    store.record(&decided("a", "Hotel A is a calm 4-star base in Lisbon.", Decision::Accept));
    store.record(&decided(
        "b",
        "Hotel B offers stunning rooms in Lisbon.",
        Decision::edit("Hotel B offers quiet rooms in Lisbon."),
    ));
    store.record(&decided("c", "Best hotel ever.", Decision::reject("too salesy")));

    let first = store.rebuild().clone();
    let second = store.rebuild().clone();

    assert_eq!(first, second);
    assert_eq!(store.rebuilds(), 2);
    assert_eq!(first.built_from, 3);
    assert_eq!(first.exemplars.len(), 1);
    assert!(first.error_patterns.contains_key("too salesy"));
    assert!(first.edit_rules.iter().any(|r| r.word == "quiet"));
}

#[test]
fn test_exemplar_limit_follows_config() {
    let mut store = LearningStore::new(LearningConfig::default().with_exemplar_count(1));
    for id in ["a", "b", "c"] {
        store.record(&decided(id, "Hotel summary in Lisbon.", Decision::Accept));
    }

    assert_eq!(store.rebuild().exemplars.len(), 1);

    let status = store.status();
    assert_eq!(status.accepted, 3);
    assert_eq!(status.unlearned(), 0);
}

// =============================================================================
// Pipeline integration
// =============================================================================

#[test]
fn test_custom_analyzer_drives_hints() {
    let analyzer = CountingAnalyzer::default();
    let generator = MockGenerator::new();
    let config = PipelineConfig::default().with_learning_interval(2);
    let mut pipeline = ReviewPipeline::new(generator.clone(), MemoryPersistence::new())
        .with_config(config)
        .with_analyzer(analyzer.clone());

    let batch = RecordBatch::from_records(["a", "b", "c", "d"].into_iter().map(hotel).collect());
    pipeline.ingest(batch).unwrap();

    while let Progress::AwaitingHuman(_) = pipeline.advance().unwrap() {
        pipeline.resume(Decision::Accept).unwrap();
    }

    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 2);
    assert_eq!(pipeline.learning().status().analyzer, "counting");

    let third = &generator.calls_for("c")[0];
    assert_eq!(third.style_guide.average_word_count, 42.0);
    assert_eq!(third.style_guide.sample_size, 2);
}
