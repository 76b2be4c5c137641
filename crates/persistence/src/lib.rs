//! ScyllaDB-backed chat history (spec §4.1, external collaborator #10):
//! an append-only `(prompt, answer, ts)` log per user, behind the
//! `txrag_core::ChatHistoryStore` adapter so the rest of the engine never
//! sees ScyllaDB directly.

pub mod chat_history;
pub mod client;
pub mod error;
pub mod schema;

pub use chat_history::{InMemoryChatHistoryStore, ScyllaChatHistoryStore};
pub use client::{ScyllaClient, ScyllaConfig};
pub use error::PersistenceError;

/// Connects to ScyllaDB and ensures the chat history table exists.
/// Callers without a `CHAT_HISTORY_URL` should reach for
/// `InMemoryChatHistoryStore` instead and skip this entirely.
pub async fn connect(config: ScyllaConfig) -> Result<ScyllaChatHistoryStore, PersistenceError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;
    Ok(ScyllaChatHistoryStore::new(client))
}

