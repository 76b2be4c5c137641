//! Two `txrag_core::ChatHistoryStore` implementations: a ScyllaDB-backed
//! one for when `CHAT_HISTORY_URL` is configured, and an in-memory
//! fallback for when it isn't (spec §6: chat history is a no-op without
//! it). Both are best-effort from the caller's point of view — a history
//! write never fails the query that produced it (spec §5).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use txrag_core::{ChatEvent, ChatHistoryStore, Error, Result};

use crate::client::ScyllaClient;
use crate::error::PersistenceError;

/// ScyllaDB-backed append-only chat history.
#[derive(Clone)]
pub struct ScyllaChatHistoryStore {
    client: ScyllaClient,
}

impl ScyllaChatHistoryStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    fn row_to_event(row: scylla::frame::response::result::Row) -> std::result::Result<ChatEvent, PersistenceError> {
        let (prompt, answer, ts_millis): (String, String, i64) =
            row.into_typed().map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

        Ok(ChatEvent {
            prompt,
            answer,
            ts: DateTime::from_timestamp_millis(ts_millis).unwrap_or_else(Utc::now),
        })
    }
}

#[async_trait]
impl ChatHistoryStore for ScyllaChatHistoryStore {
    async fn append(&self, user_id: &str, prompt: &str, answer: &str, ts: DateTime<Utc>) -> Result<()> {
        let query = format!(
            "INSERT INTO {}.chat_history (user_id, ts, prompt, answer) VALUES (?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(query, (user_id, ts.timestamp_millis(), prompt, answer))
            .await
            .map_err(|e| Error::from(PersistenceError::Query(e.to_string())))?;

        Ok(())
    }

    async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<ChatEvent>> {
        let query = format!(
            "SELECT prompt, answer, ts FROM {}.chat_history WHERE user_id = ? LIMIT ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (user_id, limit as i32))
            .await
            .map_err(|e| Error::from(PersistenceError::Query(e.to_string())))?;

        let mut events = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                events.push(Self::row_to_event(row).map_err(Error::from)?);
            }
        }
        Ok(events)
    }
}

/// Process-local fallback used when no `CHAT_HISTORY_URL` is configured.
/// History still behaves correctly within one server process; it's just
/// not durable across restarts.
#[derive(Default)]
pub struct InMemoryChatHistoryStore {
    events: RwLock<HashMap<String, Vec<ChatEvent>>>,
}

impl InMemoryChatHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatHistoryStore for InMemoryChatHistoryStore {
    async fn append(&self, user_id: &str, prompt: &str, answer: &str, ts: DateTime<Utc>) -> Result<()> {
        self.events.write().entry(user_id.to_string()).or_default().push(ChatEvent {
            prompt: prompt.to_string(),
            answer: answer.to_string(),
            ts,
        });
        Ok(())
    }

    async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<ChatEvent>> {
        let guard = self.events.read();
        let events = guard.get(user_id).map(|v| {
            let mut events = v.clone();
            events.sort_by(|a, b| b.ts.cmp(&a.ts));
            events.truncate(limit);
            events
        });
        Ok(events.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appended_events_are_listed_newest_first() {
        let store = InMemoryChatHistoryStore::new();
        store.append("u1", "p1", "a1", Utc::now() - chrono::Duration::seconds(10)).await.unwrap();
        store.append("u1", "p2", "a2", Utc::now()).await.unwrap();

        let events = store.list("u1", 10).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].prompt, "p2");
    }

    #[tokio::test]
    async fn list_respects_limit() {
        let store = InMemoryChatHistoryStore::new();
        for i in 0..5 {
            store.append("u1", &format!("p{i}"), "a", Utc::now()).await.unwrap();
        }
        let events = store.list("u1", 2).await.unwrap();
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let store = InMemoryChatHistoryStore::new();
        store.append("u1", "p1", "a1", Utc::now()).await.unwrap();
        let events = store.list("u2", 10).await.unwrap();
        assert!(events.is_empty());
    }
}
