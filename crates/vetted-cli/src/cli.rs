//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Vetted: human-in-the-loop review of generated hotel summaries
#[derive(Parser)]
#[command(name = "vetted")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Draft, critique and review summaries for a hotel file
    Review {
        /// Path to the hotel data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// LLM provider used to draft summaries
        #[arg(long, default_value = "mock")]
        llm: LlmProviderChoice,

        /// Model to use (provider-specific, e.g., "gpt-4o", "llama3.2")
        #[arg(long)]
        model: Option<String>,

        /// Completed reviews between learning rebuilds (0 disables learning)
        #[arg(long, default_value = "5")]
        learning_interval: usize,

        /// Read at most this many rows from the file
        #[arg(long)]
        max_rows: Option<usize>,
    },

    /// Show review progress for a hotel file
    Status {
        /// Path to the hotel data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what has been learned from past reviews
    Learning {
        /// Path to the hotel data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output the learned state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the checkpoint and reviewed output for a hotel file
    Reset {
        /// Path to the hotel data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

/// LLM provider choice for drafting
#[derive(Clone, Debug, Default)]
pub enum LlmProviderChoice {
    /// Template summaries, no network access
    #[default]
    Mock,
    /// Anthropic Claude API (requires ANTHROPIC_API_KEY)
    Anthropic,
    /// OpenAI GPT API (requires OPENAI_API_KEY)
    OpenAI,
    /// Ollama local models (requires Ollama running)
    Ollama,
}

impl std::str::FromStr for LlmProviderChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" | "test" => Ok(LlmProviderChoice::Mock),
            "anthropic" | "claude" => Ok(LlmProviderChoice::Anthropic),
            "openai" | "gpt" => Ok(LlmProviderChoice::OpenAI),
            "ollama" | "local" => Ok(LlmProviderChoice::Ollama),
            _ => Err(format!(
                "Unknown provider: {}. Use: mock, anthropic, openai, or ollama.",
                s
            )),
        }
    }
}

impl std::fmt::Display for LlmProviderChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProviderChoice::Mock => write!(f, "mock"),
            LlmProviderChoice::Anthropic => write!(f, "anthropic"),
            LlmProviderChoice::OpenAI => write!(f, "openai"),
            LlmProviderChoice::Ollama => write!(f, "ollama"),
        }
    }
}
