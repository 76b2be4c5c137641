//! Runtime settings, loaded with the `config` crate's layered
//! `File` + `Environment` source stack (spec §6).

use std::fmt;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, RuntimeEnvironment::Production)
    }

    /// Staging and production both reject configuration that development
    /// only warns about (missing API keys, out-of-range tunables).
    pub fn is_strict(&self) -> bool {
        matches!(self, RuntimeEnvironment::Staging | RuntimeEnvironment::Production)
    }
}

impl fmt::Display for RuntimeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuntimeEnvironment::Development => "development",
            RuntimeEnvironment::Staging => "staging",
            RuntimeEnvironment::Production => "production",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_allow_origins")]
    pub allow_origins: Vec<String>,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_allow_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_request_timeout_seconds() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            allow_origins: default_allow_origins(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Required in staging/production; an empty key is tolerated only in
    /// development, where requests to the upstream will simply fail.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_llm_temperature() -> f32 {
    0.7
}
fn default_llm_max_tokens() -> u32 {
    3000
}
fn default_llm_timeout_seconds() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            api_key: String::new(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            temperature: default_llm_temperature(),
            max_tokens: default_llm_max_tokens(),
            timeout_seconds: default_llm_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_embedding_model_id")]
    pub embedding_model_id: String,
    #[serde(default = "default_vector_top_k")]
    pub vector_top_k: usize,
    #[serde(default = "default_corpus_max_docs")]
    pub corpus_max_docs: usize,
    #[serde(default = "default_store_ttl_seconds")]
    pub store_ttl_seconds: u64,
}

fn default_embedding_model_id() -> String {
    "deterministic-hash-384".to_string()
}
fn default_vector_top_k() -> usize {
    50
}
fn default_corpus_max_docs() -> usize {
    500_000
}
fn default_store_ttl_seconds() -> u64 {
    3600
}

impl Default for RagConfig {
    fn default() -> Self {
        RagConfig {
            embedding_model_id: default_embedding_model_id(),
            vector_top_k: default_vector_top_k(),
            corpus_max_docs: default_corpus_max_docs(),
            store_ttl_seconds: default_store_ttl_seconds(),
        }
    }
}

/// Chat-history persistence is optional end to end: when `url` is unset the
/// server falls back to an in-memory, best-effort store (spec §9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatHistoryConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub chat_history: ChatHistoryConfig,
}

impl Settings {
    /// Staging/production reject a missing LLM key outright; development
    /// only logs a warning and continues (upstream calls will fail at
    /// request time instead of at boot).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_key.trim().is_empty() {
            if self.environment.is_strict() {
                return Err(ConfigError::MissingField("LLM_API_KEY".to_string()));
            }
            tracing::warn!("LLM_API_KEY is unset; upstream LLM calls will fail");
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "LLM_TEMPERATURE".to_string(),
                message: "must be within [0.0, 2.0]".to_string(),
            });
        }

        if self.rag.vector_top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "VECTOR_TOP_K".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.rag.corpus_max_docs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "CORPUS_MAX_DOCS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "must be nonzero".to_string(),
            });
        }

        Ok(())
    }
}

/// Loads settings from (in ascending precedence) an optional config file,
/// then `TXRAG_*`-prefixed environment variables, then the flat
/// spec-named environment variables the deployment surface actually uses
/// (`LLM_API_KEY`, `VECTOR_TOP_K`, ...).
pub fn load_settings() -> Result<Settings, ConfigError> {
    let env_name = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".to_string());

    let mut builder = Config::builder()
        .set_default("environment", env_name.clone())?
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{env_name}")).required(false))
        .add_source(Environment::with_prefix("TXRAG").separator("__"));

    if let Ok(v) = std::env::var("LLM_API_KEY") {
        builder = builder.set_override("llm.api_key", v)?;
    }
    if let Ok(v) = std::env::var("LLM_BASE_URL") {
        builder = builder.set_override("llm.base_url", v)?;
    }
    if let Ok(v) = std::env::var("LLM_MODEL") {
        builder = builder.set_override("llm.model", v)?;
    }
    if let Ok(v) = std::env::var("LLM_TEMPERATURE") {
        builder = builder.set_override("llm.temperature", v)?;
    }
    if let Ok(v) = std::env::var("LLM_MAX_TOKENS") {
        builder = builder.set_override("llm.max_tokens", v)?;
    }
    if let Ok(v) = std::env::var("LLM_TIMEOUT_SECONDS") {
        builder = builder.set_override("llm.timeout_seconds", v)?;
    }
    if let Ok(v) = std::env::var("EMBEDDING_MODEL_ID") {
        builder = builder.set_override("rag.embedding_model_id", v)?;
    }
    if let Ok(v) = std::env::var("VECTOR_TOP_K") {
        builder = builder.set_override("rag.vector_top_k", v)?;
    }
    if let Ok(v) = std::env::var("CORPUS_MAX_DOCS") {
        builder = builder.set_override("rag.corpus_max_docs", v)?;
    }
    if let Ok(v) = std::env::var("STORE_TTL_SECONDS") {
        builder = builder.set_override("rag.store_ttl_seconds", v)?;
    }
    if let Ok(v) = std::env::var("ALLOW_ORIGINS") {
        let origins: Vec<String> = v.split(',').map(|s| s.trim().to_string()).collect();
        builder = builder.set_override("server.allow_origins", origins)?;
    }
    if let Ok(v) = std::env::var("PORT") {
        builder = builder.set_override("server.port", v)?;
    }
    if let Ok(v) = std::env::var("CHAT_HISTORY_URL") {
        builder = builder.set_override("chat_history.url", v)?;
    }

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_internally_consistent() {
        let settings = Settings::default();
        // Development tolerates an empty key.
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn production_rejects_missing_api_key() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_zero_top_k() {
        let mut settings = Settings::default();
        settings.llm.api_key = "sk-test".to_string();
        settings.rag.vector_top_k = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn chat_history_defaults_to_absent() {
        let settings = Settings::default();
        assert!(settings.chat_history.url.is_none());
    }
}
