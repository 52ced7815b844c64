use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{ChatAction, ForceReply, Message, ParseMode};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chat::process_chat_message;
use crate::chat_commands::{
    greeting_html, handle_reset, is_slash_command, parse_command, ChatCommand,
};
use crate::runtime::AppState;
use crate::text::split_text;

/// Telegram rejects messages longer than this many bytes of text.
const MAX_MESSAGE_LEN: usize = 4096;
/// Telegram shows a chat action for about five seconds.
const TYPING_INTERVAL: Duration = Duration::from_secs(4);

pub async fn start_telegram_bot(state: Arc<AppState>, bot: Bot) -> anyhow::Result<()> {
    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .default_handler(|_| async {})
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    if is_slash_command(text) {
        match parse_command(text) {
            Some(ChatCommand::Start) => send_greeting(&bot, &msg).await,
            Some(ChatCommand::Reset) => {
                let reply = handle_reset(&state, chat_id.0).await;
                send_response(&bot, chat_id, &reply).await;
            }
            None => debug!(chat_id = chat_id.0, "ignoring unsupported command: {text}"),
        }
        return Ok(());
    }

    if text.trim().is_empty() {
        return Ok(());
    }

    let display_name = msg
        .from
        .as_ref()
        .map(|u| u.first_name.clone())
        .unwrap_or_else(|| "Unknown".into());
    info!(
        "Processing message from {} in chat {}: {}",
        display_name,
        chat_id,
        text.chars().take(100).collect::<String>()
    );

    let typing_handle = spawn_typing_indicator(bot.clone(), chat_id, TYPING_INTERVAL);
    let reply = process_chat_message(&state, chat_id.0, text, &display_name).await;
    typing_handle.abort();

    send_response(&bot, chat_id, &reply).await;
    Ok(())
}

/// Re-send the typing action every `interval` until the handle is aborted.
fn spawn_typing_indicator(bot: Bot, chat_id: ChatId, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = bot.send_chat_action(chat_id, ChatAction::Typing).await {
                debug!("Failed to send typing action: {e}");
            }
            tokio::time::sleep(interval).await;
        }
    })
}

async fn send_greeting(bot: &Bot, msg: &Message) {
    let Some(user) = msg.from.as_ref() else {
        return;
    };
    let greeting = greeting_html(user.id.0, &user.full_name());
    let result = bot
        .send_message(msg.chat.id, greeting)
        .parse_mode(ParseMode::Html)
        .reply_markup(ForceReply::new().selective())
        .await;
    if let Err(e) = result {
        warn!("Failed to send greeting to chat {}: {e}", msg.chat.id);
    }
}

pub async fn send_response(bot: &Bot, chat_id: ChatId, text: &str) {
    for chunk in split_text(text, MAX_MESSAGE_LEN) {
        if chunk.is_empty() {
            continue;
        }
        if let Err(e) = bot.send_message(chat_id, chunk).await {
            warn!("Failed to send reply to chat {chat_id}: {e}");
            return;
        }
    }
}
