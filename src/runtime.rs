use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::channels::telegram::start_telegram_bot;
use crate::config::Config;
use crate::history::HistoryStore;
use crate::llm::{create_provider, LlmProvider};

pub struct AppState {
    pub config: Config,
    pub llm: Box<dyn LlmProvider>,
    pub history: HistoryStore,
}

impl AppState {
    pub fn new(config: Config, llm: Box<dyn LlmProvider>) -> Self {
        AppState {
            config,
            llm,
            history: HistoryStore::new(),
        }
    }
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let system_prompt = config.read_system_prompt().with_context(|| {
        format!("Failed to read system prompt {}", config.system_prompt_path)
    })?;
    info!(
        "System prompt loaded from {} ({} chars)",
        config.system_prompt_path,
        system_prompt.chars().count()
    );

    let llm = create_provider(&config, system_prompt);
    info!("LLM backend: {}", llm.name());

    let bot = teloxide::Bot::new(&config.telegram_bot_token);
    let state = Arc::new(AppState::new(config, llm));

    info!("Starting Telegram long polling");
    start_telegram_bot(state, bot).await?;
    info!("Telegram polling stopped");
    Ok(())
}
