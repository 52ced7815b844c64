use serde::{Deserialize, Serialize};

/// Number of prior turns carried into each completion request.
pub const HISTORY_WINDOW: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Turn {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Turn {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Turn {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One completion call: the fixed system prompt, the newest slice of the
/// conversation and the incoming user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub prior_turns: Vec<Turn>,
    pub user_message: String,
}

impl CompletionRequest {
    pub fn build(system_prompt: &str, history: &[Turn], user_message: &str) -> Self {
        let start = history.len().saturating_sub(HISTORY_WINDOW);
        CompletionRequest {
            system_prompt: system_prompt.to_string(),
            prior_turns: history[start..].to_vec(),
            user_message: user_message.to_string(),
        }
    }

    /// Flatten into the message list sent on the wire: system, prior turns,
    /// then the new user turn.
    pub fn turns(&self) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(self.prior_turns.len() + 2);
        turns.push(Turn::system(self.system_prompt.clone()));
        turns.extend(self.prior_turns.iter().cloned());
        turns.push(Turn::user(self.user_message.clone()));
        turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("u{i}"))
                } else {
                    Turn::assistant(format!("a{i}"))
                }
            })
            .collect()
    }

    #[test]
    fn test_turn_serialization() {
        let json = serde_json::to_value(Turn::assistant("hi")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");

        let json = serde_json::to_value(Turn::system("sys")).unwrap();
        assert_eq!(json["role"], "system");
    }

    #[test]
    fn test_build_empty_history() {
        let req = CompletionRequest::build("sys", &[], "Hello");
        assert!(req.prior_turns.is_empty());
        assert_eq!(req.turns(), vec![Turn::system("sys"), Turn::user("Hello")]);
    }

    #[test]
    fn test_build_keeps_newest_four_in_order() {
        let history = history_of(6);
        let req = CompletionRequest::build("sys", &history, "Next");
        assert_eq!(req.prior_turns, history[2..].to_vec());

        let turns = req.turns();
        assert_eq!(turns.len(), 6);
        assert_eq!(turns[0], Turn::system("sys"));
        assert_eq!(turns[1], Turn::user("u2"));
        assert_eq!(turns[4], Turn::assistant("a5"));
        assert_eq!(turns[5], Turn::user("Next"));
    }

    #[test]
    fn test_build_prior_len_is_min_of_window_and_history() {
        for n in 0..10 {
            let history = history_of(n);
            let req = CompletionRequest::build("sys", &history, "m");
            assert_eq!(req.prior_turns.len(), n.min(HISTORY_WINDOW));
            assert_eq!(
                req.prior_turns.as_slice(),
                &history[n - req.prior_turns.len()..]
            );
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let history = history_of(5);
        let a = CompletionRequest::build("sys", &history, "again");
        let b = CompletionRequest::build("sys", &history, "again");
        assert_eq!(a, b);
        assert_eq!(a.turns(), b.turns());
    }
}
