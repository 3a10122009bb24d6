//! Remote model client.
//!
//! A [`ModelBackend`] performs exactly one request against one remote model and reports
//! either the completion text or a typed [`RemoteError`]. It never retries, never falls
//! back and never touches the status cache; those decisions belong to the router.

mod error_classification;
pub mod openrouter;

pub use error_classification::{classify_failure, extract_error_text};
pub use openrouter::{OpenRouterClient, OpenRouterConfig};

use crate::error_code::ErrorKind;
use async_trait::async_trait;

/// Default completion budget for user-facing calls.
pub const DEFAULT_MAX_TOKENS: u32 = 150;

/// A classified failure from a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: ErrorKind,
    /// HTTP status, when the failure came from a response rather than the network.
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn empty_response() -> Self {
        Self::new(ErrorKind::EmptyResponse, "Empty response from remote model")
    }

    /// First line of the message, used in fallback prompts and log lines.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("unknown error")
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// One remote model endpoint family.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Send one prompt to `model_id` and return its completion.
    ///
    /// Implementations must return [`ErrorKind::EmptyResponse`] rather than `Ok("")`.
    async fn invoke(&self, model_id: &str, prompt: &str, max_tokens: u32) -> RemoteResult<String>;

    /// Lightweight availability check (one-token completion, short timeout).
    async fn probe(&self, model_id: &str) -> RemoteResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_takes_first_line() {
        let err = RemoteError::new(ErrorKind::Paused, "endpoint paused\nsee docs");
        assert_eq!(err.summary(), "endpoint paused");
        assert_eq!(err.to_string(), "paused: endpoint paused\nsee docs");
    }

    #[test]
    fn test_summary_of_blank_message() {
        let err = RemoteError::new(ErrorKind::Unknown, "");
        assert_eq!(err.summary(), "unknown error");
    }
}
