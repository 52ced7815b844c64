use crate::runtime::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    Start,
    Reset,
}

pub fn is_slash_command(text: &str) -> bool {
    text.starts_with('/')
}

/// Parse `/start`, `/reset` and their `@botname` forms. Arguments after the
/// command word are ignored.
pub fn parse_command(text: &str) -> Option<ChatCommand> {
    let word = text.strip_prefix('/')?;
    let word = word.split_whitespace().next().unwrap_or("");
    let name = word.split('@').next().unwrap_or("");
    match name.to_ascii_lowercase().as_str() {
        "start" => Some(ChatCommand::Start),
        "reset" => Some(ChatCommand::Reset),
        _ => None,
    }
}

pub async fn handle_reset(state: &AppState, chat_id: i64) -> String {
    let removed = state.history.clear(chat_id).await;
    tracing::info!(chat_id, removed, "conversation reset");
    "Context cleared.".to_string()
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// HTML greeting with an inline mention of the user.
pub fn greeting_html(user_id: u64, full_name: &str) -> String {
    format!(
        "Hi <a href=\"tg://user?id={user_id}\">{}</a>!",
        escape_html(full_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_state, EchoLlm};

    #[test]
    fn test_is_slash_command() {
        assert!(is_slash_command("/start"));
        assert!(!is_slash_command("  /reset"));
        assert!(!is_slash_command("hello /start"));
        assert!(!is_slash_command(""));
    }

    #[test]
    fn test_parse_command_variants() {
        assert_eq!(parse_command("/start"), Some(ChatCommand::Start));
        assert_eq!(parse_command("/START"), Some(ChatCommand::Start));
        assert_eq!(parse_command("/start@relay_bot"), Some(ChatCommand::Start));
        assert_eq!(parse_command("/reset now"), Some(ChatCommand::Reset));
        assert_eq!(parse_command("/help"), None);
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command("reset"), None);
        assert_eq!(parse_command("  /start"), None);
    }

    #[test]
    fn test_greeting_html_escapes_name() {
        assert_eq!(
            greeting_html(42, "Tom & <Jerry>"),
            "Hi <a href=\"tg://user?id=42\">Tom &amp; &lt;Jerry&gt;</a>!"
        );
    }

    #[tokio::test]
    async fn test_handle_reset_clears_history() {
        let state = test_state(Box::new(EchoLlm));
        state.history.lock(5).await.append_exchange("a", "b");

        let reply = handle_reset(&state, 5).await;
        assert_eq!(reply, "Context cleared.");
        assert!(state.history.snapshot(5).await.is_empty());
    }
}
