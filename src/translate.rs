//! Translation backend collaborator.
//!
//! Consumed contract: text in, structured translation out. Backend failure
//! surfaces as a typed error, never a panic, so the monitoring loop is
//! unaffected by a misbehaving backend.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client-side request timeout; the backend may take minutes when it has
/// to generate audio
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Structured translation of a piece of Chinese text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Translation {
    pub meaning_english: String,
    pub pinyin_mandarin: String,
    pub jyutping_cantonese: String,
    pub equivalent_cantonese: String,
    /// Identifier of a generated audio payload, when the backend produced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_id: Option<String>,
}

/// Translation backend errors
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Trait for translation backend abstraction
pub trait TranslateClient: Send {
    /// Translate a piece of text; synchronous, may take several minutes
    fn translate(&self, text: &str) -> Result<Translation, TranslateError>;
}

/// HTTP client for the remote translation backend
pub struct HttpTranslateClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpTranslateClient {
    /// Create a client for the given endpoint with the default timeout
    pub fn new(url: &str) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout
    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(HttpTranslateClient {
            client,
            url: url.to_string(),
        })
    }
}

impl TranslateClient for HttpTranslateClient {
    fn translate(&self, text: &str) -> Result<Translation, TranslateError> {
        log::debug!("Requesting translation for {} bytes of text", text.len());

        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": text }))
            .send()?;

        let status = response.status();
        let body: serde_json::Value = response.json()?;

        parse_response(status.is_success(), status.as_u16(), body)
    }
}

/// Turn a backend response into a translation or a structured error
fn parse_response(
    success: bool,
    status: u16,
    body: serde_json::Value,
) -> Result<Translation, TranslateError> {
    // Backends report failure as {"error": "..."} with or without an
    // HTTP error status
    if let Some(message) = body.get("error").and_then(|e| e.as_str()) {
        return Err(TranslateError::Backend(message.to_string()));
    }

    if !success {
        return Err(TranslateError::Backend(format!(
            "backend returned HTTP {}",
            status
        )));
    }

    Ok(serde_json::from_value(body)?)
}
