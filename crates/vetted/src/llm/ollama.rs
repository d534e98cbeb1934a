//! Local models served by Ollama. No API key is needed.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Result, VettedError};
use crate::input::HotelRecord;

use super::http::{HttpError, JsonEndpoint, chat_messages};
use super::prompts;
use super::provider::{LlmConfig, PromptHints, SummaryGenerator};

const DEFAULT_API_URL: &str = "http://localhost:11434/api/chat";

/// Default model; pull it with `ollama pull llama3.2`.
const DEFAULT_MODEL: &str = "llama3.2";

/// Drafts with a model served by a local or remote Ollama instance.
///
/// The server address comes from `OLLAMA_HOST` when set.
#[derive(Debug)]
pub struct OllamaProvider {
    endpoint: JsonEndpoint,
    config: LlmConfig,
}

impl OllamaProvider {
    pub fn new() -> Result<Self> {
        Self::with_model(DEFAULT_MODEL)
    }

    pub fn with_model(model: impl Into<String>) -> Result<Self> {
        Self::with_config(LlmConfig::default().with_model(model))
    }

    pub fn with_config(config: LlmConfig) -> Result<Self> {
        let url = std::env::var("OLLAMA_HOST")
            .map(|host| api_url_for(&host))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::at(url, config)
    }

    /// Use an explicit chat endpoint URL.
    pub fn at(url: impl Into<String>, config: LlmConfig) -> Result<Self> {
        // Local models on modest hardware answer slowly.
        let endpoint = JsonEndpoint::new(url, Duration::from_secs(120))?;
        Ok(Self { endpoint, config })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens,
            },
            "messages": chat_messages(Some(prompts::system_prompt()), prompt),
        })
    }

    /// Ollama failures usually mean the server is down or the model is missing.
    fn explain(&self, error: HttpError) -> VettedError {
        match error {
            HttpError::Connect(_) => VettedError::Provider(format!(
                "Cannot reach Ollama at {}. Start it with: ollama serve",
                self.endpoint.url()
            )),
            HttpError::Status { body, .. } if body.contains("not found") => {
                VettedError::Provider(format!(
                    "Model '{}' not found. Pull it with: ollama pull {}",
                    self.config.model, self.config.model
                ))
            }
            other => other.for_provider("Ollama"),
        }
    }
}

fn api_url_for(host: &str) -> String {
    format!("{}/api/chat", host.trim_end_matches('/'))
}

impl SummaryGenerator for OllamaProvider {
    fn generate(&self, record: &HotelRecord, hints: &PromptHints<'_>) -> Result<String> {
        debug!(hotel_id = %record.id, model = %self.config.model, url = self.endpoint.url(), "Requesting draft from Ollama");
        let prompt = prompts::summary_prompt(record, hints);
        let reply: ChatReply = self
            .endpoint
            .post(&self.request_body(&prompt))
            .map_err(|e| self.explain(e))?;
        Ok(reply.message.content.trim().to_string())
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}
