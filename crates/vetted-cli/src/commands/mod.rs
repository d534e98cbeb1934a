//! CLI command implementations.

pub mod learning;
pub mod reset;
pub mod review;
pub mod status;

use std::path::Path;

use vetted::{Checkpoint, FilePersistence, PersistenceLayer};

/// Load the checkpoint kept next to a data file.
pub(crate) fn load_checkpoint(
    file: &Path,
) -> Result<(FilePersistence, Checkpoint), Box<dyn std::error::Error>> {
    let persistence = FilePersistence::for_data_file(file);
    match persistence.load()? {
        Some(checkpoint) => Ok((persistence, checkpoint)),
        None => Err(format!(
            "No checkpoint found at {}\nRun 'vetted review {}' first.",
            persistence.checkpoint_path().display(),
            file.display()
        )
        .into()),
    }
}
