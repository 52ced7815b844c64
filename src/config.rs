use crate::error::ChatRelayError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const DEFAULT_ENV_FILE: &str = ".env";

fn default_llm_backend() -> String {
    "yandex".into()
}
fn default_ya_base_url() -> String {
    "https://llm.api.cloud.yandex.net/v1".into()
}
fn default_ollama_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_ollama_model() -> String {
    "llama3".into()
}
fn default_system_prompt_path() -> String {
    "prompts/prompt_1.txt".into()
}
fn default_log_dir() -> String {
    "logs".into()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmBackend {
    Yandex,
    Ollama,
}

impl LlmBackend {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "yandex" => Some(LlmBackend::Yandex),
            "ollama" => Some(LlmBackend::Ollama),
            _ => None,
        }
    }
}

/// Settings read from the `.env` file. Field names on the wire are the
/// upper-case keys used in that file.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(rename = "TELEGRAM_BOT_TOKEN", default)]
    pub telegram_bot_token: String,
    #[serde(rename = "YA_API_KEY", default)]
    pub ya_api_key: String,
    #[serde(rename = "YA_FOLDER_ID", default)]
    pub ya_folder_id: String,
    #[serde(rename = "YA_BASE_URL", default = "default_ya_base_url")]
    pub ya_base_url: String,
    #[serde(rename = "LLM_BACKEND", default = "default_llm_backend")]
    pub llm_backend: String,
    #[serde(rename = "OLLAMA_BASE_URL", default = "default_ollama_base_url")]
    pub ollama_base_url: String,
    #[serde(rename = "OLLAMA_MODEL", default = "default_ollama_model")]
    pub ollama_model: String,
    #[serde(rename = "SYSTEM_PROMPT_PATH", default = "default_system_prompt_path")]
    pub system_prompt_path: String,
    #[serde(rename = "LOG_DIR", default = "default_log_dir")]
    pub log_dir: String,
}

impl Config {
    /// `CHATRELAY_ENV_FILE` overrides the default `./.env`.
    pub fn resolve_env_path() -> PathBuf {
        std::env::var("CHATRELAY_ENV_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, ChatRelayError> {
        let path_str = path.display().to_string();
        if !path.is_file() {
            return Err(ChatRelayError::Config(format!(
                "The .env file was not found at {path_str}. Make sure it exists in the project root directory."
            )));
        }
        let iter = dotenvy::from_path_iter(path)
            .map_err(|e| ChatRelayError::Config(format!("Failed to read {path_str}: {e}")))?;
        let mut pairs = Vec::new();
        for item in iter {
            let pair = item
                .map_err(|e| ChatRelayError::Config(format!("Failed to parse {path_str}: {e}")))?;
            pairs.push(pair);
        }
        Self::from_pairs(pairs)
    }

    pub fn from_pairs<I>(pairs: I) -> Result<Self, ChatRelayError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let values: Map<String, Value> = pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        let mut config: Config = serde_json::from_value(Value::Object(values))
            .map_err(|e| ChatRelayError::Config(format!("Invalid configuration: {e}")))?;
        config.post_deserialize()?;
        Ok(config)
    }

    /// Apply post-deserialization normalization and validation.
    pub(crate) fn post_deserialize(&mut self) -> Result<(), ChatRelayError> {
        self.telegram_bot_token = self.telegram_bot_token.trim().to_string();
        self.ya_api_key = self.ya_api_key.trim().to_string();
        self.ya_folder_id = self.ya_folder_id.trim().to_string();
        self.llm_backend = self.llm_backend.trim().to_lowercase();

        if self.ya_base_url.trim().is_empty() {
            self.ya_base_url = default_ya_base_url();
        }
        if self.ollama_base_url.trim().is_empty() {
            self.ollama_base_url = default_ollama_base_url();
        }
        if self.ollama_model.trim().is_empty() {
            self.ollama_model = default_ollama_model();
        }
        if self.system_prompt_path.trim().is_empty() {
            self.system_prompt_path = default_system_prompt_path();
        }
        if self.log_dir.trim().is_empty() {
            self.log_dir = default_log_dir();
        }

        if self.telegram_bot_token.is_empty() {
            return Err(missing_key("TELEGRAM_BOT_TOKEN"));
        }
        let backend = LlmBackend::parse(&self.llm_backend).ok_or_else(|| {
            ChatRelayError::Config(format!(
                "Unknown LLM_BACKEND '{}'. Expected 'yandex' or 'ollama'.",
                self.llm_backend
            ))
        })?;
        if backend == LlmBackend::Yandex {
            if self.ya_api_key.is_empty() {
                return Err(missing_key("YA_API_KEY"));
            }
            if self.ya_folder_id.is_empty() {
                return Err(missing_key("YA_FOLDER_ID"));
            }
        }

        Ok(())
    }

    pub fn backend(&self) -> LlmBackend {
        LlmBackend::parse(&self.llm_backend).unwrap_or(LlmBackend::Yandex)
    }

    /// Model URI the Yandex endpoint expects for the lite model.
    pub fn yandex_model_uri(&self) -> String {
        format!("gpt://{}/yandexgpt-lite", self.ya_folder_id)
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.log_dir)
    }

    pub fn read_system_prompt(&self) -> Result<String, ChatRelayError> {
        Ok(std::fs::read_to_string(&self.system_prompt_path)?)
    }
}

fn missing_key(key: &str) -> ChatRelayError {
    ChatRelayError::Config(format!(
        "Environment variable '{key}' not found in .env file. Please check its contents."
    ))
}
