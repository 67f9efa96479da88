//! # API Module
//!
//! This module is the AI gateway: it translates the three high-level
//! writing-assistance requests into calls against the hosted messages API,
//! applies the rate-limit retry policy, and classifies failures into
//! [`AiError`] values whose `Display` text is the user-facing message.
//!
//! The gateway owns the conversation transcript for the chat operation.
//! `improve_writing` and `analyze_content` are stateless and can be retried
//! freely by the caller; `chat_with_context` mutates the transcript on every
//! call (two turns on success, one on failure, so the user's message is
//! preserved for retry even when the call fails).
//!
//! # Example
//!
//! ```no_run
//! use quillpad::api::Assistant;
//! use quillpad::config::QuillpadConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = QuillpadConfig::default();
//! let mut assistant = Assistant::new(&config)?;
//! let improved = assistant.improve_writing("Their going to the store.").await?;
//! println!("{improved}");
//! # Ok(()) }
//! ```

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    client::{AiError, ApiClient, MessagesRequest, WireMessage},
    config::QuillpadConfig,
    template::{self, PromptTemplate},
    transcript::{Role, Transcript, Turn},
};

/// The AI gateway.
///
/// Holds the wire client, the retry knobs, the three prompt presets, and
/// the chat transcript. One instance per editing session; the transcript is
/// plain owned state, so concurrent callers must wrap the whole `Assistant`
/// in their own lock.
pub struct Assistant {
    client: ApiClient,
    model: String,
    max_attempts: u32,
    backoff_base_secs: u64,
    backoff_cap_secs: u64,
    improve: PromptTemplate,
    analyze: PromptTemplate,
    chat: PromptTemplate,
    transcript: Transcript,
}

impl Assistant {
    /// Create a gateway from configuration, using the built-in prompt
    /// presets (or the user's template overrides when present).
    ///
    /// # Errors
    /// Returns [`AiError::Other`] if the HTTP client cannot be built.
    pub fn new(config: &QuillpadConfig) -> Result<Self, AiError> {
        let improve = template::load_template("improve")
            .unwrap_or_else(|_| template::improve_preset());
        let analyze = template::load_template("analyze")
            .unwrap_or_else(|_| template::analyze_preset());
        let chat = template::load_template("chat").unwrap_or_else(|_| template::chat_preset());

        Self::with_templates(config, improve, analyze, chat)
    }

    /// Create a gateway with explicit prompt presets, bypassing the
    /// filesystem template lookup entirely. Useful for embedding callers
    /// that manage their own prompts.
    ///
    /// # Errors
    /// Returns [`AiError::Other`] if the HTTP client cannot be built.
    pub fn with_templates(
        config: &QuillpadConfig,
        improve: PromptTemplate,
        analyze: PromptTemplate,
        chat: PromptTemplate,
    ) -> Result<Self, AiError> {
        Ok(Self {
            client: ApiClient::new(config)?,
            model: config.model.clone(),
            max_attempts: config.max_attempts.max(1),
            backoff_base_secs: config.backoff_base_secs,
            backoff_cap_secs: config.backoff_cap_secs,
            improve,
            analyze,
            chat,
            transcript: Transcript::new(config.history_max_entries),
        })
    }

    /// Ask for a clarity/conciseness rewrite of `content`.
    ///
    /// Stateless; the transcript is untouched.
    pub async fn improve_writing(&self, content: &str) -> Result<String, AiError> {
        debug!(
            "Requesting writing improvements for content length: {}",
            content.len()
        );

        let request = self.single_message_request(
            &self.improve,
            format!("Please improve this writing for clarity and conciseness:\n\n{content}"),
        );
        let result = self.send_with_retry(&request).await;

        if result.is_ok() {
            info!("Successfully received writing improvements");
        }
        result
    }

    /// Ask for structured feedback on `content`: overall structure, clarity
    /// and readability, and specific suggestions.
    ///
    /// Stateless; the transcript is untouched.
    pub async fn analyze_content(&self, content: &str) -> Result<String, AiError> {
        debug!("Requesting content analysis for text length: {}", content.len());

        let request = self.single_message_request(
            &self.analyze,
            format!(
                "Analyze this text and provide feedback on:\n\
                 1. Overall structure\n\
                 2. Clarity and readability\n\
                 3. Specific improvement suggestions\n\n\
                 Text to analyze:\n{content}"
            ),
        );
        let result = self.send_with_retry(&request).await;

        if result.is_ok() {
            info!("Successfully received content analysis");
        }
        result
    }

    /// Send `message` with the full conversation as context.
    ///
    /// The user turn is appended before the request goes out; the assistant
    /// turn is appended only on success. A failed call therefore grows the
    /// transcript by exactly one entry, preserving the user's intent.
    pub async fn chat_with_context(&mut self, message: &str) -> Result<String, AiError> {
        debug!(
            "Sending message with conversation history. Message length: {}",
            message.len()
        );

        self.transcript.push_user(message.to_string());

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.chat.max_tokens,
            temperature: self.chat.temperature,
            system: self.chat.system_prompt.clone(),
            messages: self
                .transcript
                .turns()
                .iter()
                .map(|turn| WireMessage {
                    role: turn.role.as_str().to_string(),
                    content: turn.text.clone(),
                })
                .collect(),
        };

        let reply = self.send_with_retry(&request).await?;
        self.transcript.push_assistant(reply.clone());

        info!("Successfully received response with conversation context");
        Ok(reply)
    }

    /// Read-only snapshot of the conversation history, oldest first.
    pub fn history(&self) -> &[Turn] {
        self.transcript.turns()
    }

    /// Clear the conversation history. Idempotent.
    pub fn clear_history(&mut self) {
        self.transcript.clear();
    }

    fn single_message_request(&self, template: &PromptTemplate, content: String) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: template.max_tokens,
            temperature: template.temperature,
            system: template.system_prompt.clone(),
            messages: vec![WireMessage {
                role: Role::User.as_str().to_string(),
                content,
            }],
        }
    }

    /// Send with bounded exponential backoff on rate limits.
    async fn send_with_retry(&self, request: &MessagesRequest) -> Result<String, AiError> {
        retry_on_rate_limit(
            self.max_attempts,
            self.backoff_base_secs,
            self.backoff_cap_secs,
            || self.client.send(request),
        )
        .await
    }
}

/// Run `call` with bounded exponential backoff on rate limits.
///
/// Only [`AiError::RateLimited`] is retried; the first non-rate-limit
/// outcome, success included, is returned immediately. Exhausting the
/// attempt budget surfaces the final rate-limit error.
async fn retry_on_rate_limit<T, F, Fut>(
    max_attempts: u32,
    backoff_base_secs: u64,
    backoff_cap_secs: u64,
    mut call: F,
) -> Result<T, AiError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AiError>>,
{
    let mut attempt = 1;
    loop {
        match call().await {
            Err(AiError::RateLimited) if attempt < max_attempts => {
                let delay = backoff_delay(attempt, backoff_base_secs, backoff_cap_secs);
                warn!(
                    "Rate limited on attempt {attempt}/{max_attempts}; retrying in {}s",
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// Delay before the retry that follows attempt `attempt` (1-based):
/// `base * 2^(attempt-1)` seconds, capped.
pub fn backoff_delay(attempt: u32, base_secs: u64, cap_secs: u64) -> Duration {
    let exp = base_secs.saturating_mul(1u64 << (attempt.saturating_sub(1)).min(16));
    Duration::from_secs(exp.min(cap_secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn setup() {
        let _ = tracing_subscriber::fmt::try_init();
    }

    fn mock_config(api_base: &str) -> QuillpadConfig {
        QuillpadConfig {
            api_key: "mock_api_key".to_string(),
            api_base: api_base.to_string(),
            model: "mock_model".to_string(),
            // No sleeping between attempts in tests.
            backoff_base_secs: 0,
            backoff_cap_secs: 0,
            ..QuillpadConfig::default()
        }
    }

    // Built-in presets only; a user's template overrides in the config
    // directory must not leak into these assertions.
    fn mock_assistant(api_base: &str) -> Assistant {
        Assistant::with_templates(
            &mock_config(api_base),
            template::improve_preset(),
            template::analyze_preset(),
            template::chat_preset(),
        )
        .unwrap()
    }

    fn reply_body(text: &str) -> serde_json::Value {
        json!({
            "content": [{ "type": "text", "text": text }],
            "role": "assistant"
        })
    }

    #[test]
    fn test_backoff_delay_schedule() {
        // 2, 4, then 8 capped to 10 with the default knobs.
        assert_eq!(backoff_delay(1, 2, 10), Duration::from_secs(2));
        assert_eq!(backoff_delay(2, 2, 10), Duration::from_secs(4));
        assert_eq!(backoff_delay(3, 2, 10), Duration::from_secs(8));
        assert_eq!(backoff_delay(4, 2, 10), Duration::from_secs(10));
        assert_eq!(backoff_delay(10, 2, 10), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_improve_writing_returns_model_text() {
        setup();
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(200).json_body(reply_body("Much better prose."));
            })
            .await;

        let assistant = mock_assistant(&server.base_url());
        let result = assistant.improve_writing("some draft").await.unwrap();

        assert_eq!(result, "Much better prose.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_api_yields_other_error() {
        setup();
        // Nothing listens on this port.
        let assistant = mock_assistant("http://127.0.0.1:9");

        let result = assistant.analyze_content("some draft").await;
        assert!(matches!(result, Err(AiError::Other(_))));
    }

    #[tokio::test]
    async fn test_401_yields_auth_error_for_all_operations() {
        setup();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(401).json_body(json!({
                    "type": "error",
                    "error": { "type": "authentication_error", "message": "invalid x-api-key" }
                }));
            })
            .await;

        let mut assistant = mock_assistant(&server.base_url());

        let improve = assistant.improve_writing("text").await;
        assert!(matches!(improve, Err(AiError::Auth)));
        assert_eq!(
            improve.unwrap_err().to_string(),
            "Authentication error: check your API key"
        );

        assert!(matches!(assistant.analyze_content("text").await, Err(AiError::Auth)));
        assert!(matches!(assistant.chat_with_context("text").await, Err(AiError::Auth)));
    }

    #[tokio::test]
    async fn test_rate_limit_retries_three_attempts_then_fails() {
        setup();
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(429).json_body(json!({
                    "type": "error",
                    "error": { "type": "rate_limit_error", "message": "slow down" }
                }));
            })
            .await;

        let assistant = mock_assistant(&server.base_url());
        let result = assistant.improve_writing("text").await;

        assert!(matches!(result, Err(AiError::RateLimited)));
        assert_eq!(mock.hits_async().await, 3);
    }

    #[tokio::test]
    async fn test_rate_limit_recovery_succeeds_on_third_attempt() {
        setup();
        let attempts = std::cell::Cell::new(0u32);

        let result = retry_on_rate_limit(3, 0, 0, || {
            attempts.set(attempts.get() + 1);
            let attempt = attempts.get();
            async move {
                if attempt < 3 {
                    Err(AiError::RateLimited)
                } else {
                    Ok("recovered".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(attempts.get(), 3);
    }

    #[tokio::test]
    async fn test_400_is_not_retried() {
        setup();
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(400).json_body(json!({
                    "type": "error",
                    "error": { "type": "invalid_request_error", "message": "bad params" }
                }));
            })
            .await;

        let assistant = mock_assistant(&server.base_url());
        let result = assistant.improve_writing("text").await;

        assert!(matches!(result, Err(AiError::BadRequest)));
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_chat_transcript_grows_by_two_per_success() {
        setup();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(200).json_body(reply_body("doing great"));
            })
            .await;

        let mut assistant = mock_assistant(&server.base_url());
        assistant.chat_with_context("hi").await.unwrap();
        assistant.chat_with_context("how are you").await.unwrap();

        let history = assistant.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].text, "hi");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].text, "doing great");
        assert_eq!(history[2].role, Role::User);
        assert_eq!(history[2].text, "how are you");
        assert_eq!(history[3].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_chat_failure_keeps_user_turn_only() {
        setup();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(500).json_body(json!({
                    "type": "error",
                    "error": { "type": "api_error", "message": "overloaded" }
                }));
            })
            .await;

        let mut assistant = mock_assistant(&server.base_url());
        let result = assistant.chat_with_context("hi").await;

        assert!(matches!(result, Err(AiError::Api { status: 500, .. })));
        let history = assistant.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].text, "hi");
    }

    #[tokio::test]
    async fn test_clear_history_then_chat_sends_single_message() {
        setup();
        let server = MockServer::start_async().await;
        let mut any = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(200).json_body(reply_body("ok"));
            })
            .await;

        let mut assistant = mock_assistant(&server.base_url());
        assistant.chat_with_context("hi").await.unwrap();
        assistant.chat_with_context("more context").await.unwrap();
        assert_eq!(any.hits_async().await, 2);

        assistant.clear_history();
        assert!(assistant.history().is_empty());
        any.delete_async().await;

        // Only matches the exact single-message body a cleared transcript
        // should produce.
        let single = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages").json_body(json!({
                    "model": "mock_model",
                    "max_tokens": 2048,
                    "temperature": 0.7,
                    "messages": [{ "role": "user", "content": "fresh start" }]
                }));
                then.status(200).json_body(reply_body("hello again"));
            })
            .await;

        let reply = assistant.chat_with_context("fresh start").await.unwrap();
        assert_eq!(reply, "hello again");
        single.assert_async().await;
    }
}
