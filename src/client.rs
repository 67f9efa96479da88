//! # Wire client
//!
//! Low-level HTTP client for the hosted messages API. This module owns the
//! request/response wire types and the mapping from HTTP status codes to
//! [`AiError`] variants; the retry policy lives a layer up in [`crate::api`].
//!
//! One request per call, no streaming. The response's first text content
//! block is the result.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::QuillpadConfig;

const MESSAGES_PATH: &str = "/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// A classified failure from the AI gateway.
///
/// The `Display` text of each variant is the user-facing message; callers
/// that only want something printable can format the error directly, while
/// callers that need to branch (retry on rate limits, re-prompt for a key on
/// auth failures) can match on the variant.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("Authentication error: check your API key")]
    Auth,

    #[error("Bad request: check your parameters")]
    BadRequest,

    #[error("Rate limit exceeded: slow down requests")]
    RateLimited,

    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("Error calling the AI service: {0}")]
    Other(String),
}

/// A single role-tagged message on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

/// Request body for the messages endpoint.
///
/// Carries the model identifier, an output-length cap, a sampling
/// temperature, an optional system instruction, and either a single user
/// message or a full transcript as the `messages` list.
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// HTTP client for the hosted messages API.
///
/// Construction applies the configured request timeout, so no implicit
/// client defaults are in play.
pub struct ApiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl ApiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    /// Returns [`AiError::Other`] if the underlying HTTP client cannot be
    /// built (e.g., TLS backend initialization failure).
    pub fn new(config: &QuillpadConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AiError::Other(e.to_string()))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Send one request and return the first text content block.
    ///
    /// # Parameters
    /// - `request`: The fully built request body.
    ///
    /// # Returns
    /// - `Ok(String)`: The model's text.
    /// - `Err(AiError)`: A classified failure; see [`classify_status`] for
    ///   the status mapping.
    pub async fn send(&self, request: &MessagesRequest) -> Result<String, AiError> {
        let url = format!("{}{}", self.api_base, MESSAGES_PATH);
        debug!(
            "Sending request to {url}: {} message(s), max_tokens {}",
            request.messages.len(),
            request.max_tokens
        );

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(request)
            .send()
            .await
            .map_err(|e| AiError::Other(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            error!("API returned {status}: {detail}");
            return Err(classify_status(status, detail));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AiError::Other(e.to_string()))?;

        match parsed.content.first() {
            Some(block) => Ok(block.text.clone()),
            None => Err(AiError::Other("empty response from API".to_string())),
        }
    }
}

/// Map a non-success HTTP status to an [`AiError`].
///
/// 401 is an authentication failure, 400 a malformed request, 429 a rate
/// limit (retryable), anything else a generic API error carrying the status
/// and the API's own message when one was present.
pub fn classify_status(status: StatusCode, detail: String) -> AiError {
    match status {
        StatusCode::UNAUTHORIZED => AiError::Auth,
        StatusCode::BAD_REQUEST => AiError::BadRequest,
        StatusCode::TOO_MANY_REQUESTS => AiError::RateLimited,
        other => AiError::Api {
            status: other.as_u16(),
            detail,
        },
    }
}
