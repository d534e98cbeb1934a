//! In-memory persistence for tests and dry runs.

use std::sync::{Arc, Mutex, MutexGuard};

use indexmap::IndexMap;

use crate::error::{Result, VettedError};

use super::checkpoint::Checkpoint;
use super::output::OutputRow;
use super::PersistenceLayer;

#[derive(Debug, Default)]
struct MemoryState {
    rows: IndexMap<String, OutputRow>,
    checkpoint: Option<Checkpoint>,
    saves: usize,
    checkpoints: usize,
    failing_saves: usize,
    failing_checkpoints: usize,
}

/// Shared in-memory store.
///
/// Clones share state, so a test can keep a handle after moving one clone
/// into a pipeline. Failures can be injected for the next N writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing checkpoint, as if written by an earlier run.
    pub fn with_checkpoint(checkpoint: Checkpoint) -> Self {
        let persistence = Self::new();
        persistence.lock().checkpoint = Some(checkpoint);
        persistence
    }

    /// Make the next `count` saves fail.
    pub fn fail_next_saves(&self, count: usize) {
        self.lock().failing_saves = count;
    }

    /// Make the next `count` checkpoints fail.
    pub fn fail_next_checkpoints(&self, count: usize) {
        self.lock().failing_checkpoints = count;
    }

    /// Stored rows in first-save order.
    pub fn rows(&self) -> Vec<OutputRow> {
        self.lock().rows.values().cloned().collect()
    }

    pub fn row(&self, hotel_id: &str) -> Option<OutputRow> {
        self.lock().rows.get(hotel_id).cloned()
    }

    /// The last checkpoint written.
    pub fn last_checkpoint(&self) -> Option<Checkpoint> {
        self.lock().checkpoint.clone()
    }

    /// Successful saves so far.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    /// Successful checkpoints so far.
    pub fn checkpoint_count(&self) -> usize {
        self.lock().checkpoints
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PersistenceLayer for MemoryPersistence {
    fn save(&self, row: &OutputRow) -> Result<()> {
        let mut state = self.lock();
        if state.failing_saves > 0 {
            state.failing_saves -= 1;
            return Err(VettedError::Persistence(format!(
                "Injected save failure for '{}'",
                row.hotel_id
            )));
        }
        state.rows.insert(row.hotel_id.clone(), row.clone());
        state.saves += 1;
        Ok(())
    }

    fn remove(&self, hotel_id: &str) -> Result<bool> {
        Ok(self.lock().rows.shift_remove(hotel_id).is_some())
    }

    fn checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        let mut state = self.lock();
        if state.failing_checkpoints > 0 {
            state.failing_checkpoints -= 1;
            return Err(VettedError::Persistence(
                "Injected checkpoint failure".to_string(),
            ));
        }
        state.checkpoint = Some(checkpoint.clone());
        state.checkpoints += 1;
        Ok(())
    }

    fn load(&self) -> Result<Option<Checkpoint>> {
        Ok(self.lock().checkpoint.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::LearningState;

    fn row(id: &str, summary: &str) -> OutputRow {
        OutputRow {
            hotel_id: id.to_string(),
            hotel_name: "Hotel".to_string(),
            draft_summary: summary.to_string(),
            final_summary: summary.to_string(),
            status: "accepted".to_string(),
            review_timestamp: "2026-01-01T12:00:00+00:00".to_string(),
            critique_flags: "[]".to_string(),
        }
    }

    #[test]
    fn test_injected_save_failure() {
        let persistence = MemoryPersistence::new();
        let handle = persistence.clone();
        handle.fail_next_saves(1);

        assert!(persistence.save(&row("a", "One.")).is_err());
        assert!(handle.rows().is_empty());

        persistence.save(&row("a", "One.")).unwrap();
        persistence.save(&row("a", "Two.")).unwrap();
        assert_eq!(handle.rows().len(), 1);
        assert_eq!(handle.row("a").unwrap().final_summary, "Two.");
        assert_eq!(handle.save_count(), 2);
    }

    #[test]
    fn test_remove_row() {
        let persistence = MemoryPersistence::new();
        persistence.save(&row("a", "One.")).unwrap();
        persistence.save(&row("b", "Two.")).unwrap();

        assert!(persistence.remove("a").unwrap());
        assert!(!persistence.remove("a").unwrap());
        assert_eq!(persistence.rows().len(), 1);
        assert!(persistence.row("a").is_none());
    }

    #[test]
    fn test_failed_checkpoint_keeps_previous() {
        let persistence = MemoryPersistence::new();
        let first = Checkpoint::new(None, 1, Vec::new(), LearningState::default(), Vec::new());
        persistence.checkpoint(&first).unwrap();

        persistence.fail_next_checkpoints(1);
        let second = Checkpoint::new(None, 2, Vec::new(), LearningState::default(), Vec::new());
        assert!(persistence.checkpoint(&second).is_err());

        assert_eq!(persistence.load().unwrap().unwrap().completed_reviews, 1);
        assert_eq!(persistence.checkpoint_count(), 1);
    }
}
