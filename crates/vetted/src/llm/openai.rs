//! GPT models through the OpenAI chat completions API.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Result, VettedError};
use crate::input::HotelRecord;

use super::http::{JsonEndpoint, chat_messages};
use super::prompts;
use super::provider::{LlmConfig, PromptHints, SummaryGenerator};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Drafts with an OpenAI chat model (`gpt-4o-mini` unless configured).
#[derive(Debug)]
pub struct OpenAIProvider {
    endpoint: JsonEndpoint,
    config: LlmConfig,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, LlmConfig::default())
    }

    pub fn with_config(api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        Self::at(API_URL, api_key, config)
    }

    /// Read the key from `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            VettedError::Config("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    pub(crate) fn at(url: &str, api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        let bearer = format!("Bearer {}", api_key.into());
        let endpoint =
            JsonEndpoint::new(url, Duration::from_secs(60))?.with_header(AUTHORIZATION, &bearer)?;
        Ok(Self { endpoint, config })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": chat_messages(Some(prompts::system_prompt()), prompt),
        })
    }
}

impl SummaryGenerator for OpenAIProvider {
    fn generate(&self, record: &HotelRecord, hints: &PromptHints<'_>) -> Result<String> {
        debug!(hotel_id = %record.id, model = %self.config.model, "Requesting draft from OpenAI");
        let prompt = prompts::summary_prompt(record, hints);
        let reply: CompletionReply = self
            .endpoint
            .post(&self.request_body(&prompt))
            .map_err(|e| e.for_provider("OpenAI"))?;
        reply.first_text().map(|text| text.trim().to_string())
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    choices: Vec<Choice>,
}

impl CompletionReply {
    /// Text of the first choice. A null content counts as empty text.
    fn first_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| VettedError::Provider("OpenAI returned no choices".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
