//! Claude models through the Anthropic Messages API.

use std::time::Duration;

use reqwest::header::HeaderName;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Result, VettedError};
use crate::input::HotelRecord;

use super::http::{JsonEndpoint, chat_messages};
use super::prompts;
use super::provider::{LlmConfig, PromptHints, SummaryGenerator};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Drafts with a Claude model.
#[derive(Debug)]
pub struct AnthropicProvider {
    endpoint: JsonEndpoint,
    config: LlmConfig,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, LlmConfig::default().with_model(DEFAULT_MODEL))
    }

    pub fn with_config(api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        Self::at(API_URL, api_key, config)
    }

    /// Read the key from `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            VettedError::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    pub(crate) fn at(url: &str, api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        let endpoint = JsonEndpoint::new(url, Duration::from_secs(60))?
            .with_header(HeaderName::from_static("x-api-key"), &api_key.into())?
            .with_header(HeaderName::from_static("anthropic-version"), API_VERSION)?;
        Ok(Self { endpoint, config })
    }

    /// The system prompt is a top-level field here, not a message.
    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": prompts::system_prompt(),
            "messages": chat_messages(None, prompt),
        })
    }
}

impl SummaryGenerator for AnthropicProvider {
    fn generate(&self, record: &HotelRecord, hints: &PromptHints<'_>) -> Result<String> {
        debug!(hotel_id = %record.id, model = %self.config.model, "Requesting draft from Anthropic");
        let prompt = prompts::summary_prompt(record, hints);
        let reply: MessagesReply = self
            .endpoint
            .post(&self.request_body(&prompt))
            .map_err(|e| e.for_provider("Anthropic"))?;
        Ok(reply.text().trim().to_string())
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    content: Vec<ContentBlock>,
}

impl MessagesReply {
    /// Concatenated text blocks; empty when the model returned none.
    fn text(self) -> String {
        self.content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::LearningState;
    use crate::llm::http::tests::serve_once;

    #[test]
    fn test_reply_text_skips_non_text_blocks() {
        let raw = r#"{"content": [
            {"type": "thinking"},
            {"type": "text", "text": "Hotel Lumen is a 4-star hotel."}
        ]}"#;
        let parsed: MessagesReply = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "Hotel Lumen is a 4-star hotel.");
    }

    #[test]
    fn test_default_model() {
        let provider = AnthropicProvider::new("test-key").unwrap();
        assert_eq!(provider.config().model, DEFAULT_MODEL);
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn test_malformed_key_is_refused() {
        assert!(matches!(
            AnthropicProvider::new("sk-ant\n"),
            Err(VettedError::Config(_))
        ));
    }

    #[test]
    fn test_system_prompt_is_top_level() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"content": [{"type": "text", "text": "Hotel Lumen sits in Lisbon."}]}"#,
        );
        let provider = AnthropicProvider::at(&url, "test-key", LlmConfig::default()).unwrap();
        let state = LearningState::default();

        let draft = provider
            .generate(&HotelRecord::new("h1", "Hotel Lumen"), &PromptHints::from_state(&state))
            .unwrap();
        assert_eq!(draft, "Hotel Lumen sits in Lisbon.");

        let sent: Value = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert!(sent["system"].is_string());
        assert_eq!(sent["messages"].as_array().unwrap().len(), 1);
        assert_eq!(sent["messages"][0]["role"], "user");
    }
}
