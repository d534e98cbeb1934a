//! Self-critique of draft summaries.
//!
//! The critique engine checks a draft against its source record and returns
//! a set of named flags. Flags are advisory: they are shown to the reviewer
//! and counted by the learning loop, but never reject a draft on their own.

mod engine;
mod flags;

pub use engine::{CritiqueConfig, CritiqueEngine, CritiqueReport, critique};
pub use flags::{CritiqueFlag, FlagSet};
