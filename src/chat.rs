//! One chat exchange: annotate the user's text, ask the backend, record both
//! turns and hand back the text to deliver.

use tracing::{debug, error, info, warn};

use crate::llm::render_failure;
use crate::runtime::AppState;
use crate::text::annotate_user_message;

pub async fn process_chat_message(
    state: &AppState,
    chat_id: i64,
    text: &str,
    display_name: &str,
) -> String {
    let user_message = annotate_user_message(text, display_name);

    // Held until both turns are appended so exchanges in one chat never interleave.
    let mut history = state.history.lock(chat_id).await;
    debug!(chat_id, history = ?&*history, "history before exchange");

    let reply = match state.llm.chat(&user_message, &history).await {
        Ok(reply) => reply,
        Err(err) => {
            if err.is_backend_failure() {
                error!(chat_id, backend = state.llm.name(), "completion failed: {err}");
            } else {
                warn!(chat_id, backend = state.llm.name(), "completion not attempted: {err}");
            }
            render_failure(state.llm.as_ref(), &err)
        }
    };

    history.append_exchange(&user_message, &reply);
    info!(
        chat_id,
        history_len = history.len(),
        "reply ready ({} chars)",
        reply.chars().count()
    );
    reply
}
