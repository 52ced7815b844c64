use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Config, LlmBackend};
use crate::error::ChatRelayError;
use crate::llm_types::{CompletionRequest, Turn};

pub const YANDEX_TEMPERATURE: f64 = 0.3;
pub const YANDEX_MAX_TOKENS: u32 = 256;
pub const OLLAMA_TIMEOUT: Duration = Duration::from_secs(60);

const EMPTY_REPLY: &str = "(empty response)";

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// One completion backend. `history` is the full conversation; providers only
/// send its newest slice.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Prefix used when a failure is shown to the user in place of a reply.
    fn error_prefix(&self) -> &str {
        "An error occurred"
    }

    async fn chat(&self, message: &str, history: &[Turn]) -> Result<String, ChatRelayError>;
}

/// Text that stands in for a reply when the backend call failed.
pub fn render_failure(provider: &dyn LlmProvider, err: &ChatRelayError) -> String {
    format!("{}: {err}", provider.error_prefix())
}

pub fn create_provider(config: &Config, system_prompt: String) -> Box<dyn LlmProvider> {
    match config.backend() {
        LlmBackend::Yandex => Box::new(YandexProvider::new(config, system_prompt)),
        LlmBackend::Ollama => Box::new(OllamaProvider::new(config, system_prompt)),
    }
}

fn non_empty_reply(content: Option<String>) -> String {
    match content {
        Some(text) if !text.trim().is_empty() => text,
        _ => EMPTY_REPLY.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Yandex cloud provider (OpenAI-compatible chat completions)
// ---------------------------------------------------------------------------

pub struct YandexProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    chat_url: String,
    system_prompt: String,
}

impl YandexProvider {
    pub fn new(config: &Config, system_prompt: String) -> Self {
        let chat_url = format!(
            "{}/chat/completions",
            config.ya_base_url.trim_end_matches('/')
        );
        YandexProvider {
            http: reqwest::Client::new(),
            api_key: config.ya_api_key.clone(),
            model: config.yandex_model_uri(),
            chat_url,
            system_prompt,
        }
    }
}

#[derive(Debug, Serialize)]
struct OaiRequest<'a> {
    model: &'a str,
    messages: Vec<Turn>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OaiResponse {
    choices: Vec<OaiChoice>,
}

#[derive(Debug, Deserialize)]
struct OaiChoice {
    message: OaiMessage,
}

#[derive(Debug, Deserialize)]
struct OaiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OaiErrorResponse {
    error: OaiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OaiErrorDetail {
    message: String,
}

fn parse_oai_reply(body: &str) -> Result<String, ChatRelayError> {
    let parsed: OaiResponse = serde_json::from_str(body).map_err(|e| {
        ChatRelayError::MalformedResponse(format!("Failed to parse response: {e}\nBody: {body}"))
    })?;
    let choice = parsed.choices.into_iter().next().ok_or_else(|| {
        ChatRelayError::MalformedResponse("response contained no choices".into())
    })?;
    Ok(non_empty_reply(choice.message.content))
}

#[async_trait]
impl LlmProvider for YandexProvider {
    fn name(&self) -> &str {
        "yandex"
    }

    async fn chat(&self, message: &str, history: &[Turn]) -> Result<String, ChatRelayError> {
        let request = CompletionRequest::build(&self.system_prompt, history, message);
        let body = OaiRequest {
            model: &self.model,
            messages: request.turns(),
            temperature: YANDEX_TEMPERATURE,
            max_tokens: YANDEX_MAX_TOKENS,
        };
        debug!(messages = ?body.messages, "yandex request");

        let response = self
            .http
            .post(&self.chat_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(status = status.as_u16(), body = %text, "yandex response");

        if !status.is_success() {
            let detail = serde_json::from_str::<OaiErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(ChatRelayError::HttpStatus {
                status: status.as_u16(),
                body: detail,
            });
        }

        parse_oai_reply(&text)
    }
}

// ---------------------------------------------------------------------------
// Local Ollama provider
// ---------------------------------------------------------------------------

pub struct OllamaProvider {
    http: reqwest::Client,
    model: String,
    chat_url: String,
    system_prompt: String,
    timeout: Duration,
}

impl OllamaProvider {
    pub fn new(config: &Config, system_prompt: String) -> Self {
        let chat_url = format!(
            "{}/api/chat",
            config.ollama_base_url.trim_end_matches('/')
        );
        OllamaProvider {
            http: reqwest::Client::new(),
            model: config.ollama_model.clone(),
            chat_url,
            system_prompt,
            timeout: OLLAMA_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<Turn>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OaiMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorResponse {
    error: String,
}

fn parse_ollama_reply(body: &str) -> Result<String, ChatRelayError> {
    let parsed: OllamaResponse = serde_json::from_str(body).map_err(|e| {
        ChatRelayError::MalformedResponse(format!("Failed to parse response: {e}\nBody: {body}"))
    })?;
    Ok(non_empty_reply(parsed.message.content))
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn error_prefix(&self) -> &str {
        "Ollama error"
    }

    async fn chat(&self, message: &str, history: &[Turn]) -> Result<String, ChatRelayError> {
        let request = CompletionRequest::build(&self.system_prompt, history, message);
        let body = OllamaRequest {
            model: &self.model,
            messages: request.turns(),
            stream: false,
        };
        debug!(messages = ?body.messages, "ollama request");

        let response = self
            .http
            .post(&self.chat_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(status = status.as_u16(), body = %text, "ollama response");

        if !status.is_success() {
            let detail = serde_json::from_str::<OllamaErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            return Err(ChatRelayError::HttpStatus {
                status: status.as_u16(),
                body: detail,
            });
        }

        parse_ollama_reply(&text)
    }
}
