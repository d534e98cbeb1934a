//! Durable pipeline progress and reviewed output.
//!
//! A [`PersistenceLayer`] stores two things: one [`OutputRow`] per stored item
//! (an upsert keyed by hotel id) and the latest [`Checkpoint`] of the whole
//! pipeline. Both are written so a failed write never corrupts what was
//! previously saved.
//!
//! File layout produced by [`FilePersistence::for_data_file`]:
//! ```text
//! data/
//! ├── hotels.csv                  # Input batch
//! ├── hotels.checkpoint.json      # Pipeline checkpoint
//! └── hotels_reviewed.csv         # Stored summaries
//! ```

mod checkpoint;
mod file;
mod memory;
mod output;

pub use checkpoint::{CHECKPOINT_VERSION, Checkpoint};
pub use file::{FilePersistence, checkpoint_path, output_path};
pub use memory::MemoryPersistence;
pub use output::OutputRow;

use crate::error::Result;

/// Durable storage for pipeline progress and outcomes.
pub trait PersistenceLayer: Send + Sync {
    /// Insert or replace the output row for `row.hotel_id`.
    fn save(&self, row: &OutputRow) -> Result<()>;

    /// Drop the output row for `hotel_id`. Returns whether one existed.
    fn remove(&self, hotel_id: &str) -> Result<bool>;

    /// Replace the stored checkpoint.
    fn checkpoint(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// Load the last checkpoint, if one exists.
    fn load(&self) -> Result<Option<Checkpoint>>;
}

impl<P: PersistenceLayer + ?Sized> PersistenceLayer for Box<P> {
    fn save(&self, row: &OutputRow) -> Result<()> {
        (**self).save(row)
    }

    fn remove(&self, hotel_id: &str) -> Result<bool> {
        (**self).remove(hotel_id)
    }

    fn checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        (**self).checkpoint(checkpoint)
    }

    fn load(&self) -> Result<Option<Checkpoint>> {
        (**self).load()
    }
}
