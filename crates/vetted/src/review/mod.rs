//! Human-in-the-loop review of drafted summaries.
//!
//! Each record becomes a [`ReviewItem`] that moves strictly forward:
//!
//! ```text
//! Pending -> Drafted -> Critiqued -> AwaitingHuman -> Accepted -> Stored
//!    |                                     |      \-> Edited   -> Stored
//!    \-> Rejected (data-error,             \-> Rejected
//!        generation-failed)
//! ```
//!
//! [`ReviewPipeline`] owns the items and drives them; [`run_session`] pairs a
//! pipeline with a [`Reviewer`] until the batch is done or the reviewer stops.

mod decision;
mod item;
mod pipeline;
mod session;
mod stats;

pub use decision::Decision;
pub use item::{ReviewItem, ReviewOutcome, ReviewStatus};
pub use pipeline::{Progress, ReviewPipeline};
pub use session::{Reviewer, ReviewerAction, SessionOutcome, run_session};
pub use stats::BatchStats;
