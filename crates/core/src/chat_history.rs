//! `ChatHistoryStore` — the opaque adapter contract spec §9 calls for:
//! "ORM-persisted chat history -> opaque adapter". The backing store (or
//! its absence) is external to the core.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    pub prompt: String,
    pub answer: String,
    pub ts: DateTime<Utc>,
}

#[async_trait]
pub trait ChatHistoryStore: Send + Sync {
    /// Append one `(prompt, answer)` turn. Best-effort: a failure here must
    /// never fail the query that produced it (spec §5).
    async fn append(&self, user_id: &str, prompt: &str, answer: &str, ts: DateTime<Utc>) -> Result<()>;

    /// Most recent `limit` events for a user, newest first.
    async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<ChatEvent>>;
}
