//! The review state machine.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::critique::{CritiqueEngine, CritiqueFlag, FlagSet};
use crate::error::{Result, VettedError};
use crate::input::{HotelRecord, RecordBatch, SourceMetadata};
use crate::learning::{FeedbackAnalyzer, LearningStore};
use crate::llm::{PromptHints, SummaryGenerator};
use crate::persistence::{Checkpoint, OutputRow, PersistenceLayer};

use super::decision::{Decision, clean_reason};
use super::item::{ReviewItem, ReviewOutcome, ReviewStatus};
use super::stats::BatchStats;

/// Where the pipeline stopped after [`ReviewPipeline::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// The item at this index needs a human decision.
    AwaitingHuman(usize),
    /// Every item is Stored or Rejected.
    Complete(BatchStats),
}

/// Drives hotel records through draft, critique, human review and storage.
///
/// Items are processed one at a time in batch order. The only suspension point
/// is human review: [`advance`](Self::advance) runs until an item awaits a
/// decision, and [`resume`](Self::resume) applies it.
pub struct ReviewPipeline {
    config: PipelineConfig,
    engine: CritiqueEngine,
    generator: Arc<dyn SummaryGenerator>,
    persistence: Box<dyn PersistenceLayer>,
    learning: LearningStore,
    items: Vec<ReviewItem>,
    source: Option<SourceMetadata>,
    completed: usize,
    checkpoint_stale: bool,
}

impl fmt::Debug for ReviewPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewPipeline")
            .field("generator", &self.generator.name())
            .field("items", &self.items.len())
            .field("completed", &self.completed)
            .field("learning", &self.learning)
            .finish()
    }
}

impl ReviewPipeline {
    /// Create a pipeline with the default configuration.
    pub fn new(
        generator: impl SummaryGenerator + 'static,
        persistence: impl PersistenceLayer + 'static,
    ) -> Self {
        let config = PipelineConfig::default();
        Self {
            engine: CritiqueEngine::with_config(config.critique.clone()),
            learning: LearningStore::new(config.learning.clone()),
            config,
            generator: Arc::new(generator),
            persistence: Box::new(persistence),
            items: Vec::new(),
            source: None,
            completed: 0,
            checkpoint_stale: false,
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.engine = CritiqueEngine::with_config(config.critique.clone());
        self.learning = std::mem::take(&mut self.learning).with_config(config.learning.clone());
        self.config = config;
        self
    }

    /// Use a different analyzer for learning rebuilds.
    pub fn with_analyzer(mut self, analyzer: impl FeedbackAnalyzer + 'static) -> Self {
        self.learning = std::mem::take(&mut self.learning).with_analyzer(analyzer);
        self
    }

    /// Load a batch as Pending items and write the first checkpoint.
    ///
    /// Fails with `DuplicateRecord` if two records share an id.
    pub fn ingest(&mut self, batch: RecordBatch) -> Result<usize> {
        if !self.items.is_empty() {
            return Err(VettedError::Config(
                "Pipeline already holds a batch; reset it before ingesting another".to_string(),
            ));
        }
        batch.check_unique_ids()?;

        self.items = batch.records.into_iter().map(ReviewItem::new).collect();
        self.source = batch.source;
        info!(items = self.items.len(), generator = self.generator.name(), "Ingested batch");

        self.write_checkpoint()?;
        Ok(self.items.len())
    }

    /// Reload the last checkpoint, if any.
    ///
    /// When `source` is given and the checkpoint was taken for a file with a
    /// different hash, fails with `CheckpointMismatch`. Returns whether a
    /// checkpoint was found.
    pub fn restore(&mut self, source: Option<&SourceMetadata>) -> Result<bool> {
        let Some(checkpoint) = self.persistence.load()? else {
            return Ok(false);
        };

        if let (Some(expected), Some(found)) = (checkpoint.source.as_ref(), source) {
            if expected.hash != found.hash {
                return Err(VettedError::CheckpointMismatch {
                    expected: format!("{} ({})", expected.file, expected.hash),
                    found: format!("{} ({})", found.file, found.hash),
                });
            }
        }

        self.items = checkpoint.items;
        self.source = checkpoint.source;
        self.completed = checkpoint.completed_reviews;
        self.learning.restore(
            checkpoint.learning_history,
            checkpoint.learning_state,
            checkpoint.learning_rebuilds,
        );
        self.checkpoint_stale = false;

        info!(
            items = self.items.len(),
            completed = self.completed,
            saved_at = %checkpoint.saved_at,
            "Restored checkpoint"
        );
        Ok(true)
    }

    /// Run until an item awaits a human decision or the batch is done.
    ///
    /// A stale checkpoint is rewritten first, and an approved item whose store
    /// failed earlier is stored again before any new drafting.
    pub fn advance(&mut self) -> Result<Progress> {
        if self.checkpoint_stale {
            self.write_checkpoint()?;
        }

        loop {
            let Some(index) = self.next_index() else {
                return Ok(Progress::Complete(self.stats()));
            };

            match self.items[index].status {
                ReviewStatus::Pending => self.draft(index)?,
                ReviewStatus::Drafted => self.critique(index)?,
                ReviewStatus::Critiqued => self.suspend(index)?,
                ReviewStatus::AwaitingHuman => return Ok(Progress::AwaitingHuman(index)),
                ReviewStatus::Accepted | ReviewStatus::Edited => self.store(index)?,
                ReviewStatus::Rejected | ReviewStatus::Stored => {
                    unreachable!("terminal items are never selected")
                }
            }
        }
    }

    /// Apply a human decision to the item awaiting review.
    ///
    /// Invalid decisions leave the item AwaitingHuman. If storing an approved
    /// summary fails, the item stays Accepted/Edited and the next
    /// [`advance`](Self::advance) or [`flush`](Self::flush) retries the store.
    /// A rejection first drops any output row an earlier run left for the
    /// hotel.
    pub fn resume(&mut self, decision: Decision) -> Result<ReviewStatus> {
        let index = self
            .awaiting_index()
            .ok_or_else(|| VettedError::InvalidDecision("No item is awaiting review".to_string()))?;
        decision.validate()?;
        if matches!(decision, Decision::Reject { .. }) {
            self.discard_row(index)?;
        }

        let label = decision.label();
        let item = &mut self.items[index];
        match decision {
            Decision::Accept => {
                item.transition(ReviewStatus::Accepted)?;
                item.final_summary = item.draft_summary.clone();
                item.outcome = Some(ReviewOutcome::Accepted);
            }
            Decision::Edit { text } => {
                item.transition(ReviewStatus::Edited)?;
                item.final_summary = Some(text.trim().to_string());
                item.outcome = Some(ReviewOutcome::Edited);
            }
            Decision::Reject { reason } => {
                item.transition(ReviewStatus::Rejected)?;
                item.final_summary = None;
                item.rejection_reason = clean_reason(reason.as_deref());
                item.outcome = Some(ReviewOutcome::Rejected);
            }
        }
        item.review_timestamp = Some(Utc::now());
        info!(hotel_id = %item.record.id, decision = label, "Review decided");

        if item.status == ReviewStatus::Rejected {
            self.finish(index)?;
        } else {
            self.store(index)?;
        }
        Ok(self.items[index].status)
    }

    /// Retry a failed store and rewrite a stale checkpoint, without drafting.
    pub fn flush(&mut self) -> Result<()> {
        let unstored = self
            .items
            .iter()
            .position(|i| matches!(i.status, ReviewStatus::Accepted | ReviewStatus::Edited));
        if let Some(index) = unstored {
            self.store(index)?;
        }
        if self.checkpoint_stale {
            self.write_checkpoint()?;
        }
        Ok(())
    }

    /// Whether the last checkpoint write failed.
    pub fn checkpoint_stale(&self) -> bool {
        self.checkpoint_stale
    }

    /// The item awaiting a human decision, if any.
    pub fn current(&self) -> Option<&ReviewItem> {
        self.awaiting_index().map(|i| &self.items[i])
    }

    /// All items in batch order.
    pub fn items(&self) -> &[ReviewItem] {
        &self.items
    }

    /// Get an item by hotel id.
    pub fn item(&self, hotel_id: &str) -> Option<&ReviewItem> {
        self.items.iter().find(|i| i.record.id == hotel_id)
    }

    /// Progress counts for the batch.
    pub fn stats(&self) -> BatchStats {
        BatchStats::from_items(&self.items, self.completed, &self.config)
    }

    /// Terminal transitions so far.
    pub fn completed_reviews(&self) -> usize {
        self.completed
    }

    pub fn learning(&self) -> &LearningStore {
        &self.learning
    }

    pub fn source(&self) -> Option<&SourceMetadata> {
        self.source.as_ref()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Name of the generator in use.
    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    fn next_index(&self) -> Option<usize> {
        self.items.iter().position(|i| !i.status.is_terminal())
    }

    fn awaiting_index(&self) -> Option<usize> {
        self.items.iter().position(|i| i.is_awaiting())
    }

    /// Validate the record and draft a summary for it.
    fn draft(&mut self, index: usize) -> Result<()> {
        if let Err(e) = self.items[index].record.validate() {
            let reason = match e {
                VettedError::MalformedRecord { reason, .. } => reason,
                other => other.to_string(),
            };
            warn!(hotel_id = %self.items[index].record.id, %reason, "Rejecting malformed record");
            return self.reject_by_pipeline(index, CritiqueFlag::DataError, reason);
        }

        let (result, attempts) = self.generate(&self.items[index].record);
        let item = &mut self.items[index];
        item.generation_attempts += attempts;

        match result {
            Ok(draft) => {
                item.draft_summary = Some(draft);
                item.transition(ReviewStatus::Drafted)?;
                debug!(hotel_id = %item.record.id, attempts, "Drafted summary");
                Ok(())
            }
            Err(e) => {
                warn!(hotel_id = %item.record.id, error = %e, "Rejecting item after failed generation");
                self.reject_by_pipeline(index, CritiqueFlag::GenerationFailed, e.to_string())
            }
        }
    }

    /// Call the generator, retrying with simplified hints on empty or failed output.
    fn generate(&self, record: &HotelRecord) -> (Result<String>, u32) {
        let hints = PromptHints::from_state(self.learning.state());
        let retries = self.config.generation_retries;
        let mut attempts = 0;
        let mut problem = String::new();

        for attempt in 0..=retries {
            let attempt_hints = if attempt == 0 {
                hints.clone()
            } else {
                hints.without_exemplars()
            };
            attempts += 1;

            match self.generator.generate(record, &attempt_hints) {
                Ok(text) if !text.trim().is_empty() => {
                    return (Ok(text.trim().to_string()), attempts);
                }
                Ok(_) => problem = "generator returned an empty summary".to_string(),
                Err(e) => problem = e.to_string(),
            }

            if attempt < retries {
                warn!(hotel_id = %record.id, %problem, "Draft failed, retrying without exemplars");
            }
        }

        (
            Err(VettedError::GenerationFailure {
                hotel_id: record.id.clone(),
                reason: problem,
            }),
            attempts,
        )
    }

    fn critique(&mut self, index: usize) -> Result<()> {
        let item = &mut self.items[index];
        let report = self
            .engine
            .evaluate(item.draft_summary.as_deref().unwrap_or(""), &item.record);

        item.critique_notes = report.notes(self.engine.config());
        item.critique_flags = report.flags;
        item.transition(ReviewStatus::Critiqued)?;
        debug!(hotel_id = %item.record.id, flags = item.critique_flags.len(), "Critiqued draft");
        Ok(())
    }

    fn suspend(&mut self, index: usize) -> Result<()> {
        self.items[index].transition(ReviewStatus::AwaitingHuman)?;
        debug!(hotel_id = %self.items[index].record.id, "Awaiting human review");
        self.write_checkpoint()
    }

    /// Commit an approved item to the output, then finish it.
    fn store(&mut self, index: usize) -> Result<()> {
        let row = OutputRow::from_item(&self.items[index])?;
        if let Err(e) = self.persistence.save(&row) {
            warn!(hotel_id = %row.hotel_id, error = %e, "Failed to store summary; it will be retried");
            return Err(e);
        }
        self.items[index].transition(ReviewStatus::Stored)?;
        self.finish(index)
    }

    fn reject_by_pipeline(&mut self, index: usize, flag: CritiqueFlag, reason: String) -> Result<()> {
        self.discard_row(index)?;
        let item = &mut self.items[index];
        item.transition(ReviewStatus::Rejected)?;
        item.critique_flags = FlagSet::from([flag]);
        item.critique_notes = vec![reason];
        item.outcome = Some(ReviewOutcome::Rejected);
        item.review_timestamp = Some(Utc::now());
        self.finish(index)
    }

    /// Rejected hotels never keep an output row. One can exist when an
    /// approval was stored but its checkpoint was lost.
    fn discard_row(&self, index: usize) -> Result<()> {
        let hotel_id = &self.items[index].record.id;
        if self.persistence.remove(hotel_id)? {
            warn!(hotel_id = %hotel_id, "Removed output row stored before the last checkpoint");
        }
        Ok(())
    }

    /// Bookkeeping after a terminal transition.
    fn finish(&mut self, index: usize) -> Result<()> {
        self.learning.record(&self.items[index]);
        self.completed += 1;
        info!(
            hotel_id = %self.items[index].record.id,
            status = self.items[index].status.label(),
            completed = self.completed,
            "Item finished"
        );

        if self.config.rebuild_due(self.completed) {
            let state = self.learning.rebuild();
            info!(
                completed = self.completed,
                exemplars = state.exemplars.len(),
                patterns = state.error_patterns.len(),
                "Rebuilt learning state"
            );
        }

        self.write_checkpoint()
    }

    fn write_checkpoint(&mut self) -> Result<()> {
        let checkpoint = Checkpoint::new(
            self.source.clone(),
            self.completed,
            self.items.clone(),
            self.learning.state().clone(),
            self.learning.history().to_vec(),
        )
        .with_learning_rebuilds(self.learning.rebuilds());

        match self.persistence.checkpoint(&checkpoint) {
            Ok(()) => {
                self.checkpoint_stale = false;
                Ok(())
            }
            Err(e) => {
                self.checkpoint_stale = true;
                warn!(error = %e, "Checkpoint write failed; will retry on next advance");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Location, QualityAttribute, QualityScores};
    use crate::llm::{MockGenerator, MockResponse};
    use crate::persistence::MemoryPersistence;

    fn record(id: &str) -> HotelRecord {
        HotelRecord::new(id, format!("Hotel {}", id))
            .with_location(Location::new("Lisbon", "Portugal"))
            .with_star_rating(4)
            .with_scores(
                QualityScores::new()
                    .with(QualityAttribute::Cleanliness, 8.7)
                    .with(QualityAttribute::Staff, 9.1),
            )
    }

    #[test]
    fn test_generate_retries_without_exemplars() {
        let generator = MockGenerator::new().with_responses([MockResponse::Empty]);
        let pipeline = ReviewPipeline::new(generator.clone(), MemoryPersistence::new());

        let (result, attempts) = pipeline.generate(&record("a"));
        assert!(result.is_ok());
        assert_eq!(attempts, 2);
        assert_eq!(generator.call_count(), 2);
    }

    #[test]
    fn test_generate_gives_up_after_retries() {
        let generator = MockGenerator::new().with_responses([
            MockResponse::Error("timeout".to_string()),
            MockResponse::Empty,
        ]);
        let pipeline = ReviewPipeline::new(generator, MemoryPersistence::new());

        let (result, attempts) = pipeline.generate(&record("a"));
        assert!(matches!(result, Err(VettedError::GenerationFailure { .. })));
        assert_eq!(attempts, 2);
    }

    #[test]
    fn test_second_ingest_is_refused() {
        let mut pipeline = ReviewPipeline::new(MockGenerator::new(), MemoryPersistence::new());
        pipeline
            .ingest(RecordBatch::from_records(vec![record("a")]))
            .unwrap();
        assert!(matches!(
            pipeline.ingest(RecordBatch::from_records(vec![record("b")])),
            Err(VettedError::Config(_))
        ));
    }

    #[test]
    fn test_resume_without_awaiting_item() {
        let mut pipeline = ReviewPipeline::new(MockGenerator::new(), MemoryPersistence::new());
        assert!(matches!(
            pipeline.resume(Decision::Accept),
            Err(VettedError::InvalidDecision(_))
        ));
    }

    #[test]
    fn test_trimmed_generator_output() {
        let generator = MockGenerator::new().with_responses([MockResponse::Text("  Padded.\n".to_string())]);
        let mut pipeline = ReviewPipeline::new(generator, MemoryPersistence::new());
        pipeline
            .ingest(RecordBatch::from_records(vec![record("a")]))
            .unwrap();

        assert_eq!(pipeline.advance().unwrap(), Progress::AwaitingHuman(0));
        assert_eq!(pipeline.current().unwrap().draft_summary.as_deref(), Some("Padded."));
    }
}
