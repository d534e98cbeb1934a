//! Vetted: human-in-the-loop review pipeline for generated hotel summaries.
//!
//! Vetted drafts short factual hotel summaries with a language model, checks
//! each draft against a fixed set of rules, and parks it until a human accepts,
//! edits, or rejects it. Reviewed outcomes are persisted and fed back into the
//! prompts used for later drafts.
//!
//! # Core Principles
//!
//! - **Human is the final gate**: critique flags are advisory, never automatic rejections
//! - **Resumable**: every suspension and every terminal outcome is checkpointed
//! - **Adaptive**: hints are rebuilt from review history every few completed reviews
//!
//! # Example
//!
//! ```no_run
//! use vetted::{Decision, FilePersistence, MockGenerator, Progress, RecordReader, ReviewPipeline};
//!
//! let batch = RecordReader::new().read_file("hotels.csv").unwrap();
//! let persistence = FilePersistence::for_data_file("hotels.csv");
//! let mut pipeline = ReviewPipeline::new(MockGenerator::new(), persistence);
//! pipeline.ingest(batch).unwrap();
//!
//! while let Progress::AwaitingHuman(_) = pipeline.advance().unwrap() {
//!     pipeline.resume(Decision::Accept).unwrap();
//! }
//! ```

pub mod config;
pub mod critique;
pub mod error;
pub mod input;
pub mod learning;
pub mod llm;
pub mod persistence;
pub mod review;

pub use config::PipelineConfig;
pub use critique::{CritiqueConfig, CritiqueEngine, CritiqueFlag, CritiqueReport, FlagSet};
pub use error::{Result, VettedError};
pub use input::{
    Coordinates, HotelRecord, Location, QualityAttribute, QualityScores, RecordBatch,
    RecordReader, SourceMetadata,
};
pub use learning::{
    EditRule, ErrorPattern, Exemplar, FeedbackAnalyzer, FeedbackRecord, HeuristicAnalyzer,
    LearningConfig, LearningState, LearningStatus, LearningStore, SentenceStructure,
    StyleGuide,
};
pub use llm::{
    AnthropicProvider, LlmConfig, MockGenerator, MockResponse, OllamaProvider, OpenAIProvider,
    PromptHints, SummaryGenerator,
};
pub use persistence::{Checkpoint, FilePersistence, MemoryPersistence, OutputRow, PersistenceLayer};
pub use review::{
    BatchStats, Decision, Progress, ReviewItem, ReviewOutcome, ReviewPipeline, ReviewStatus,
    Reviewer, ReviewerAction, SessionOutcome, run_session,
};
