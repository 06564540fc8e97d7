// Chat-completion streaming client using reqwest-eventsource.
//
// Sends role-tagged messages to an OpenAI-compatible `/chat/completions`
// endpoint with `stream: true`, forwards each content delta over an mpsc
// channel as it arrives, and returns the assembled reply.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use pickwise_core::config::Config;

// ---------------------------------------------------------------------------
// Messages and errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion service not configured: set OPENAI_API_KEY or credentials.toml")]
    NotConfigured,

    #[error("request failed: {0}")]
    Request(String),

    #[error("completion service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("completion service returned an empty response")]
    EmptyResponse,
}

/// A source of chat completions.
///
/// Content fragments are sent over `tokens` as they arrive; the full reply
/// is returned once the stream finishes. A dropped receiver does not abort
/// the request.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tokens: mpsc::Sender<String>,
    ) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// OpenAiClient
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Streaming client for any OpenAI-compatible chat endpoint.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    organization: Option<String>,
    model: String,
    api_base: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, api_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            organization: None,
            model,
            api_base: api_base.trim_end_matches('/').to_string(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization.filter(|o| !o.trim().is_empty());
        self
    }

    pub fn with_sampling(mut self, max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tokens: mpsc::Sender<String>,
    ) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: true,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut request = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body);
        if let Some(org) = &self.organization {
            request = request.header("OpenAI-Organization", org);
        }

        let mut es = request
            .eventsource()
            .map_err(|e| LlmError::Request(format!("failed to create event source: {e}")))?;

        info!(model = %self.model, messages = messages.len(), "requesting completion");

        let mut full_text = String::new();
        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => {
                    debug!("SSE connection opened");
                }
                Ok(Event::Message(msg)) => {
                    if is_done(&msg.data) {
                        debug!("received [DONE]");
                        es.close();
                        break;
                    }
                    if let Some(api_error) = extract_api_error(&msg.data) {
                        es.close();
                        return Err(LlmError::Stream(api_error));
                    }
                    if let Some(text) = parse_delta_content(&msg.data) {
                        if text.is_empty() {
                            continue;
                        }
                        full_text.push_str(&text);
                        let _ = tokens.send(text).await;
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    // Some servers close without sending [DONE]
                    debug!("SSE stream ended by server");
                    es.close();
                    break;
                }
                Err(err) => {
                    warn!(?err, "SSE stream error");
                    es.close();
                    return Err(error_from_event_source(err).await);
                }
            }
        }

        if full_text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        info!(chars = full_text.len(), "completion finished");
        Ok(full_text)
    }
}

// ---------------------------------------------------------------------------
// LlmClient wrapper
// ---------------------------------------------------------------------------

/// Either a configured completion client or a disabled placeholder.
///
/// A missing API key is not fatal at startup: the disabled client fails
/// every request with [`LlmError::NotConfigured`].
pub enum LlmClient {
    Active(OpenAiClient),
    Disabled,
}

impl LlmClient {
    pub fn from_config(config: &Config) -> Self {
        match &config.credentials.openai_api_key {
            Some(key) if !key.trim().is_empty() => {
                let client = OpenAiClient::new(
                    key.clone(),
                    config.llm.model.clone(),
                    config.llm.api_base.clone(),
                )
                .with_organization(config.credentials.openai_organization.clone())
                .with_sampling(config.llm.max_tokens, config.llm.temperature);
                LlmClient::Active(client)
            }
            _ => {
                warn!("no API key configured; completion requests will fail");
                LlmClient::Disabled
            }
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LlmClient::Active(_))
    }
}

#[async_trait]
impl ChatCompletion for LlmClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tokens: mpsc::Sender<String>,
    ) -> Result<String, LlmError> {
        match self {
            LlmClient::Active(client) => client.complete(messages, tokens).await,
            LlmClient::Disabled => Err(LlmError::NotConfigured),
        }
    }
}

// ---------------------------------------------------------------------------
// SSE JSON parsing helpers
// ---------------------------------------------------------------------------

/// Extract `choices[0].delta.content` from a streamed chunk.
///
/// Expected shape: `{ "choices": [ { "delta": { "content": "..." } } ] }`
pub(crate) fn parse_delta_content(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}

/// Whether this chunk is the end-of-stream sentinel.
pub(crate) fn is_done(data: &str) -> bool {
    data.trim() == "[DONE]"
}

/// Extract `error.message` from an error payload.
pub(crate) fn extract_api_error(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

/// Turn an SSE error into an `LlmError`, reading the response body for
/// non-success statuses.
async fn error_from_event_source(err: reqwest_eventsource::Error) -> LlmError {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, response) => {
            let body = response.text().await.unwrap_or_default();
            let message = extract_api_error(&body).unwrap_or(body);
            LlmError::Status {
                status: status.as_u16(),
                message,
            }
        }
        reqwest_eventsource::Error::Transport(e) => LlmError::Request(e.to_string()),
        other => LlmError::Stream(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
