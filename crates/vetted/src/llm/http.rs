//! Blocking JSON transport shared by the HTTP providers.
//!
//! Each provider only decides the URL, its headers, the request body and how
//! to pull text out of the reply. Sending, status handling and decoding live
//! here.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

use crate::error::{Result, VettedError};

/// Why a request produced no usable reply.
#[derive(Debug, Error)]
pub(crate) enum HttpError {
    #[error("could not connect: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("sent an unreadable reply: {0}")]
    Decode(#[source] reqwest::Error),
}

impl HttpError {
    /// Wrap as a provider error labelled with `provider`.
    pub(crate) fn for_provider(self, provider: &str) -> VettedError {
        VettedError::Provider(format!("{} {}", provider, self))
    }
}

/// A fixed URL and header set that accepts JSON bodies.
#[derive(Debug)]
pub(crate) struct JsonEndpoint {
    client: Client,
    url: String,
    headers: HeaderMap,
}

impl JsonEndpoint {
    pub(crate) fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VettedError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client,
            url: url.into(),
            headers,
        })
    }

    /// Add a header sent with every request. Fails on values that are not
    /// valid header text, e.g. a pasted key with a trailing newline.
    pub(crate) fn with_header(mut self, name: HeaderName, value: &str) -> Result<Self> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| VettedError::Config(format!("Invalid value for header {}: {}", name, e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// POST `body` and decode a successful reply as `T`.
    pub(crate) fn post<T: DeserializeOwned>(&self, body: &Value) -> std::result::Result<T, HttpError> {
        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    HttpError::Connect(e)
                } else {
                    HttpError::Request(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(HttpError::Status { status, body });
        }

        response.json().map_err(HttpError::Decode)
    }
}

/// Chat messages for a single-turn request, with an optional system turn.
pub(crate) fn chat_messages(system: Option<&str>, user: &str) -> Value {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system {
        messages.push(json!({ "role": "system", "content": system }));
    }
    messages.push(json!({ "role": "user", "content": user }));
    Value::Array(messages)
}
