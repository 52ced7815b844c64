use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatRelayError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ChatRelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatRelayError::Timeout(err.to_string())
        } else if err.is_decode() {
            ChatRelayError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            ChatRelayError::HttpStatus {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ChatRelayError::Network(err.to_string())
        }
    }
}

impl ChatRelayError {
    /// Whether the failure happened talking to the completion backend, as
    /// opposed to local setup problems.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            ChatRelayError::Network(_)
                | ChatRelayError::Timeout(_)
                | ChatRelayError::HttpStatus { .. }
                | ChatRelayError::MalformedResponse(_)
        )
    }
}
