//! Summary generation through language models.
//!
//! The pipeline only sees the [`SummaryGenerator`] trait: a record and the
//! current learned hints go in, draft text comes out.
//!
//! # Supported Providers
//!
//! - **OpenAI** - GPT models via API (requires `OPENAI_API_KEY`)
//! - **Anthropic** - Claude models via API (requires `ANTHROPIC_API_KEY`)
//! - **Ollama** - Local models, no API key needed (honours `OLLAMA_HOST`)
//! - **Mock** - Deterministic template summaries for tests and dry runs
//!
//! # Example
//!
//! ```no_run
//! use vetted::{MemoryPersistence, OllamaProvider, ReviewPipeline};
//!
//! let pipeline = ReviewPipeline::new(OllamaProvider::new().unwrap(), MemoryPersistence::new());
//! ```

mod anthropic;
mod http;
mod mock;
mod ollama;
mod openai;
pub mod prompts;
mod provider;

pub use anthropic::AnthropicProvider;
pub use mock::{MockGenerator, MockResponse, RecordedCall};
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use provider::{LlmConfig, PromptHints, SummaryGenerator};
