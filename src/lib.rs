pub mod channels;
pub mod chat;
pub mod chat_commands;
pub mod config;
pub mod llm;
pub mod runtime;

pub use channels::telegram;
pub use chatrelay_app::logging;
pub use chatrelay_core::error;
pub use chatrelay_core::llm_types;
pub use chatrelay_core::text;
pub use chatrelay_storage::history;

#[cfg(test)]
pub mod test_support {
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::config::Config;
    use crate::error::ChatRelayError;
    use crate::llm::LlmProvider;
    use crate::llm_types::Turn;
    use crate::runtime::AppState;

    pub fn env_lock() -> MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    pub fn test_config() -> Config {
        Config::from_pairs(vec![
            ("TELEGRAM_BOT_TOKEN".to_string(), "tok".to_string()),
            ("YA_API_KEY".to_string(), "key".to_string()),
            ("YA_FOLDER_ID".to_string(), "folder".to_string()),
        ])
        .expect("valid test config")
    }

    pub fn test_state(llm: Box<dyn LlmProvider>) -> AppState {
        AppState::new(test_config(), llm)
    }

    /// Replies with how many stored turns it was handed and the message.
    pub struct EchoLlm;

    #[async_trait]
    impl LlmProvider for EchoLlm {
        fn name(&self) -> &str {
            "echo"
        }

        async fn chat(&self, message: &str, history: &[Turn]) -> Result<String, ChatRelayError> {
            Ok(format!("echo[{}]: {message}", history.len()))
        }
    }

    pub struct FailingLlm;

    #[async_trait]
    impl LlmProvider for FailingLlm {
        fn name(&self) -> &str {
            "failing"
        }

        async fn chat(&self, _message: &str, _history: &[Turn]) -> Result<String, ChatRelayError> {
            Err(ChatRelayError::Network("connection refused".into()))
        }
    }

    pub struct SlowLlm {
        delay: Duration,
    }

    impl SlowLlm {
        pub fn new(delay_ms: u64) -> Self {
            SlowLlm {
                delay: Duration::from_millis(delay_ms),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for SlowLlm {
        fn name(&self) -> &str {
            "slow"
        }

        async fn chat(&self, message: &str, _history: &[Turn]) -> Result<String, ChatRelayError> {
            tokio::time::sleep(self.delay).await;
            Ok(format!("slow: {message}"))
        }
    }
}
