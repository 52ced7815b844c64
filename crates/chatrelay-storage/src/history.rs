//! In-memory conversation history, keyed by chat id.
//!
//! Each chat owns its own async mutex. Callers hold a [`ConversationGuard`]
//! across the whole read, complete, append sequence so exchanges for one
//! chat are serialized while different chats run in parallel. Nothing here
//! survives a restart.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use chatrelay_core::llm_types::Turn;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

type Conversation = Arc<Mutex<Vec<Turn>>>;

#[derive(Default)]
pub struct HistoryStore {
    chats: Mutex<HashMap<i64, Conversation>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn conversation(&self, chat_id: i64) -> Conversation {
        let mut chats = self.chats.lock().await;
        chats
            .entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone()
    }

    /// Acquire exclusive access to one chat's history, creating it empty on
    /// first use.
    pub async fn lock(&self, chat_id: i64) -> ConversationGuard {
        let conversation = self.conversation(chat_id).await;
        ConversationGuard {
            chat_id,
            turns: conversation.lock_owned().await,
        }
    }

    pub async fn snapshot(&self, chat_id: i64) -> Vec<Turn> {
        self.lock(chat_id).await.to_vec()
    }

    /// Drop every turn recorded for `chat_id`. Returns how many were removed.
    pub async fn clear(&self, chat_id: i64) -> usize {
        let mut guard = self.lock(chat_id).await;
        let removed = guard.turns.len();
        guard.turns.clear();
        debug!(chat_id, removed, "history cleared");
        removed
    }
}

pub struct ConversationGuard {
    chat_id: i64,
    turns: OwnedMutexGuard<Vec<Turn>>,
}

impl ConversationGuard {
    /// Record one finished exchange: the user turn, then the assistant turn.
    pub fn append_exchange(&mut self, user_message: &str, reply: &str) {
        append_exchange(&mut self.turns, user_message, reply);
        debug!(
            chat_id = self.chat_id,
            len = self.turns.len(),
            "history appended"
        );
    }
}

impl Deref for ConversationGuard {
    type Target = [Turn];

    fn deref(&self) -> &[Turn] {
        &self.turns
    }
}

pub fn append_exchange(history: &mut Vec<Turn>, user_message: &str, reply: &str) {
    history.push(Turn::user(user_message));
    history.push(Turn::assistant(reply));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_core::llm_types::Role;
    use std::time::Duration;

    #[test]
    fn test_append_exchange_pushes_user_then_assistant() {
        let mut history = vec![Turn::user("a"), Turn::assistant("b")];
        append_exchange(&mut history, "c", "d");
        assert_eq!(history.len(), 4);
        assert_eq!(history[2], Turn::user("c"));
        assert_eq!(history[3], Turn::assistant("d"));
    }

    #[tokio::test]
    async fn test_new_chat_starts_empty() {
        let store = HistoryStore::new();
        let guard = store.lock(42).await;
        assert!(guard.is_empty());
    }

    #[tokio::test]
    async fn test_chats_are_independent() {
        let store = HistoryStore::new();
        store.lock(1).await.append_exchange("hi", "hello");
        assert_eq!(store.snapshot(1).await.len(), 2);
        assert!(store.snapshot(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_turns() {
        let store = HistoryStore::new();
        {
            let mut guard = store.lock(7).await;
            guard.append_exchange("one", "two");
            guard.append_exchange("three", "four");
        }
        assert_eq!(store.clear(7).await, 4);
        assert!(store.snapshot(7).await.is_empty());
        assert_eq!(store.clear(7).await, 0);
    }

    #[tokio::test]
    async fn test_same_chat_exchanges_do_not_interleave() {
        let store = Arc::new(HistoryStore::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut guard = store.lock(99).await;
                let user = format!("u{i}");
                tokio::time::sleep(Duration::from_millis(5)).await;
                guard.append_exchange(&user, &format!("a{i}"));
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let history = store.snapshot(99).await;
        assert_eq!(history.len(), 16);
        for pair in history.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(&pair[0].content[1..], &pair[1].content[1..]);
        }
    }
}
