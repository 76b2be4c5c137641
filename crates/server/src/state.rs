//! Shared application state (spec §5): the per-user store map, the
//! shared embedding model, the LLM backend, the prompt assembler, and the
//! chat-history adapter — one instance handed to every handler through
//! axum's `State` extractor, the way the teacher's `AppState` is built
//! once in `main` and cloned (cheaply, via `Arc` fields) into the router.

use std::sync::Arc;
use std::time::Duration;

use txrag_config::Settings;
use txrag_core::{ChatHistoryStore, Embedder};
use txrag_llm::{LlmBackend, OpenAiBackend, PromptAssembler};
use txrag_persistence::{InMemoryChatHistoryStore, ScyllaConfig};
use txrag_rag::{DeterministicEmbedder, EmbeddingConfig, PerUserStore};

use crate::error::ServerError;

/// Context budget for the prompt assembler's retrieved-document block.
/// Independent of `LLM_MAX_TOKENS`, which bounds the model's *output*
/// (spec §4.8 fixes output around 3000 tokens; this bounds input instead).
const MAX_CONTEXT_TOKENS: usize = 8000;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub stores: Arc<PerUserStore>,
    pub embedder: Arc<dyn Embedder>,
    pub llm: Arc<dyn LlmBackend>,
    pub prompt_assembler: Arc<PromptAssembler>,
    pub chat_history: Arc<dyn ChatHistoryStore>,
}

impl AppState {
    /// Builds the shared state from loaded settings. Chat-history
    /// connectivity is best-effort at startup too: a `CHAT_HISTORY_URL`
    /// that fails to connect degrades to the in-memory store rather than
    /// failing the whole server (spec §6: "if absent, history is a
    /// no-op" — extended here to "if unreachable").
    pub async fn new(config: Settings) -> Result<Self, ServerError> {
        let embedder: Arc<dyn Embedder> = Arc::new(DeterministicEmbedder::new(EmbeddingConfig::default()));

        let llm: Arc<dyn LlmBackend> = Arc::new(
            OpenAiBackend::new(config.llm.clone())
                .map_err(txrag_core::Error::from)
                .map_err(ServerError)?,
        );

        let chat_history: Arc<dyn ChatHistoryStore> = match &config.chat_history.url {
            Some(url) => {
                let scylla_config = ScyllaConfig::from_url(url);
                match txrag_persistence::connect(scylla_config).await {
                    Ok(store) => Arc::new(store),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to connect to ScyllaDB, falling back to in-memory chat history");
                        Arc::new(InMemoryChatHistoryStore::new())
                    }
                }
            }
            None => Arc::new(InMemoryChatHistoryStore::new()),
        };

        let stores = Arc::new(PerUserStore::new(Duration::from_secs(config.rag.store_ttl_seconds)));
        let prompt_assembler = Arc::new(PromptAssembler::new(MAX_CONTEXT_TOKENS));

        Ok(Self {
            config: Arc::new(config),
            stores,
            embedder,
            llm,
            prompt_assembler,
            chat_history,
        })
    }
}
