//! Google Gemini transport
//!
//! `POST {base_url}/v1beta/models/{model}:generateContent?key=...` with the
//! prompt as the single user part. The reply text is every part of the first
//! candidate concatenated; an empty reply becomes `{}` so the extractor always
//! has something to work with.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use ticketai_core::errors::{ExError, ExErrorKind, Result};
use ticketai_core::extract::EMPTY_OBJECT;
use ticketai_core_types::Sensitive;
use tracing::debug;

use crate::config::ModelConfig;
use crate::model::ModelClient;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: Sensitive<String>,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    /// Build a client from model configuration
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration is incomplete, `ExternalService`
    /// if the HTTP client cannot be built.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        if !config.is_complete() {
            return Err(ExError::new(ExErrorKind::InvalidConfig)
                .with_op("gemini_client")
                .with_message("Model configuration is missing (base_url/api_key/model)."));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .map_err(|e| {
                ExError::new(ExErrorKind::ExternalService)
                    .with_op("gemini_client")
                    .with_message(e.to_string())
            })?;

        Ok(Self {
            client,
            endpoint: endpoint(&config.base_url, &config.model),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// `generateContent` URL without the key
pub fn endpoint(base_url: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{}:generateContent",
        base_url.trim().trim_end_matches('/'),
        model.trim()
    )
}

fn request_body(prompt: &str) -> GeminiRequest<'_> {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts: vec![GeminiPart { text: prompt }],
        }],
    }
}

/// Concatenate the parts of the first candidate
fn reply_text(body: &str) -> Result<String> {
    let response: GeminiResponse = serde_json::from_str(body).map_err(|e| {
        ExError::new(ExErrorKind::Serialization)
            .with_op("model_complete")
            .with_message(format!("unreadable model response: {e}"))
    })?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        Ok(EMPTY_OBJECT.to_string())
    } else {
        Ok(text)
    }
}

fn transport_error(err: reqwest::Error) -> ExError {
    let kind = if err.is_timeout() {
        ExErrorKind::Timeout
    } else {
        ExErrorKind::ExternalService
    };
    // The URL carries the key
    let err = err.without_url();
    ExError::new(kind)
        .with_op("model_complete")
        .with_message(format!("AI call failed: {err}"))
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(endpoint = %self.endpoint, "sending generateContent request");

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.expose().as_str())])
            .json(&request_body(prompt))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        debug!(status = status.as_u16(), body_len = body.len(), "model responded");

        if !status.is_success() {
            return Err(ExError::new(ExErrorKind::ExternalService)
                .with_op("model_complete")
                .with_message(format!(
                    "AI call failed: {} {}. {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or(""),
                    body
                )));
        }

        reply_text(&body)
    }
}
