//! LLM backend and prompt assembly (spec §4.8): the chat-completion
//! adapter every non-`STATISTICAL` query mode calls through, and the
//! `PromptAssembler` that turns a classified query, its filters,
//! statistics, and retrieved documents into the two-message bundle the
//! adapter sends upstream.

pub mod backend;
pub mod prompt;

pub use backend::{FinishReason, GenerationResult, LlmBackend, OpenAiBackend};
pub use prompt::{estimate_tokens, Message, PromptAssembler, Role};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("request timed out")]
    Timeout,

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for txrag_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => txrag_core::Error::UpstreamTimeout,
            other => txrag_core::Error::UpstreamUnavailable(other.to_string()),
        }
    }
}
