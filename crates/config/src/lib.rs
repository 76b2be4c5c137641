//! Settings for the transaction-RAG engine, loaded from environment
//! variables (and an optional config file) via the `config` crate.

pub mod settings;

pub use settings::{
    load_settings, ChatHistoryConfig, LlmConfig, RagConfig, RuntimeEnvironment, ServerConfig,
    Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("missing required configuration field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(path) => ConfigError::FileNotFound(path),
            config::ConfigError::Message(msg) => ConfigError::ParseError(msg),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}
