//! Driving a pipeline with an interactive reviewer.

use tracing::{debug, info, warn};

use crate::error::{Result, VettedError};

use super::decision::Decision;
use super::item::ReviewItem;
use super::pipeline::{Progress, ReviewPipeline};
use super::stats::BatchStats;

/// What the reviewer wants to do with the item shown.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewerAction {
    Decide(Decision),
    /// End the session; the item stays AwaitingHuman.
    Stop,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Every item is terminal.
    Completed(BatchStats),
    /// The reviewer stopped early.
    Paused(BatchStats),
}

/// Source of human decisions, e.g. a terminal prompt.
pub trait Reviewer {
    /// Decide on the item awaiting review.
    fn review(&mut self, item: &ReviewItem, stats: &BatchStats) -> Result<ReviewerAction>;

    /// Called when a decision was refused; the same item is offered again.
    fn decision_refused(&mut self, _item: &ReviewItem, _error: &VettedError) {}

    /// Called after a decision was applied.
    fn decision_applied(&mut self, _item: &ReviewItem) {}
}

/// Advance the pipeline and ask `reviewer` for each decision.
pub fn run_session<R: Reviewer + ?Sized>(
    pipeline: &mut ReviewPipeline,
    reviewer: &mut R,
) -> Result<SessionOutcome> {
    info!(generator = pipeline.generator_name(), "Starting review session");

    loop {
        let index = match pipeline.advance()? {
            Progress::Complete(stats) => {
                info!(stored = stats.stored, rejected = stats.rejected, "Batch complete");
                return Ok(SessionOutcome::Completed(stats));
            }
            Progress::AwaitingHuman(index) => index,
        };

        let stats = pipeline.stats();
        let action = reviewer.review(&pipeline.items()[index], &stats)?;

        match action {
            ReviewerAction::Stop => {
                info!(remaining = stats.remaining(), "Review session paused");
                return Ok(SessionOutcome::Paused(stats));
            }
            ReviewerAction::Decide(decision) => match pipeline.resume(decision) {
                Ok(status) => {
                    debug!(status = status.label(), "Decision applied");
                    reviewer.decision_applied(&pipeline.items()[index]);
                }
                Err(e @ VettedError::InvalidDecision(_)) => {
                    reviewer.decision_refused(&pipeline.items()[index], &e);
                }
                Err(e @ VettedError::Persistence(_)) => {
                    // The decision stands in memory; it only needs writing out.
                    warn!(error = %e, "Decision not persisted, retrying once");
                    if pipeline.flush().is_err() {
                        return Err(e);
                    }
                    reviewer.decision_applied(&pipeline.items()[index]);
                }
                Err(e) => return Err(e),
            },
        }
    }
}
