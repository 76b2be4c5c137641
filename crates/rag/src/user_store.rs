//! Per-user corpus store.
//!
//! One entry per `user_id`, holding that user's ingested transactions,
//! their canonical documents, and their embeddings as a single immutable
//! snapshot. `/ingest` replaces the snapshot wholesale — it never merges
//! into what was there before (spec §9 Open Question, resolved: replace,
//! not append). Readers in flight keep working against the snapshot they
//! already hold; a concurrent ingest swaps in a new one without blocking
//! them (spec §5).
//!
//! Grounded in the teacher's `Arc<RwLock<Settings>>` hot-swap pattern in
//! `AppState`, generalized from a single global value to one value per key
//! via `dashmap::DashMap`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;

use txrag_core::{Document, Transaction, TransactionMetadata};

use crate::vector_store::VectorStore;

/// One user's ingested corpus, fixed at construction time.
pub struct UserCorpus {
    pub transactions: Vec<Transaction>,
    pub metadata: Vec<TransactionMetadata>,
    pub documents: Vec<Document>,
    pub vector_store: VectorStore,
    ingested_at: Instant,
    ingested_at_wall: DateTime<Utc>,
}

impl UserCorpus {
    pub fn new(
        transactions: Vec<Transaction>,
        metadata: Vec<TransactionMetadata>,
        documents: Vec<Document>,
        vector_store: VectorStore,
    ) -> Self {
        Self {
            transactions,
            metadata,
            documents,
            vector_store,
            ingested_at: Instant::now(),
            ingested_at_wall: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Wall-clock ingest time, surfaced as `/status`'s `updated_at`.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.ingested_at_wall
    }

    fn age(&self) -> Duration {
        self.ingested_at.elapsed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusStatus {
    NotIngested,
    Ready {
        document_count: usize,
        updated_at: DateTime<Utc>,
    },
    Expired,
}

/// Concurrency-safe map of `user_id -> UserCorpus`. Each slot is an
/// independent `RwLock<Arc<UserCorpus>>`: replacing user A's corpus never
/// contends with a read of user B's (spec §5 isolation property).
#[derive(Default)]
pub struct PerUserStore {
    slots: DashMap<String, Arc<RwLock<Arc<UserCorpus>>>>,
    ttl: Duration,
}

impl PerUserStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
        }
    }

    /// Atomically swap in a freshly-ingested corpus, discarding whatever
    /// was there before.
    pub fn replace(&self, user_id: &str, corpus: UserCorpus) {
        let slot = self
            .slots
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Arc::new(corpus_placeholder()))));
        *slot.write() = Arc::new(corpus);
    }

    /// A read-only snapshot of the current corpus, if one exists and has
    /// not expired under `STORE_TTL_SECONDS`.
    pub fn snapshot(&self, user_id: &str) -> Option<Arc<UserCorpus>> {
        let slot = self.slots.get(user_id)?;
        let corpus = slot.read().clone();
        if corpus.is_empty() || corpus.age() > self.ttl {
            return None;
        }
        Some(corpus)
    }

    pub fn status(&self, user_id: &str) -> CorpusStatus {
        match self.slots.get(user_id) {
            None => CorpusStatus::NotIngested,
            Some(slot) => {
                let corpus = slot.read().clone();
                if corpus.is_empty() {
                    CorpusStatus::NotIngested
                } else if corpus.age() > self.ttl {
                    CorpusStatus::Expired
                } else {
                    CorpusStatus::Ready {
                        document_count: corpus.len(),
                        updated_at: corpus.updated_at(),
                    }
                }
            }
        }
    }
}

fn corpus_placeholder() -> UserCorpus {
    UserCorpus::new(
        Vec::new(),
        Vec::new(),
        Vec::new(),
        VectorStore::build(Default::default(), Vec::new()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_user_is_not_ingested() {
        let store = PerUserStore::new(Duration::from_secs(3600));
        assert_eq!(store.status("nobody"), CorpusStatus::NotIngested);
        assert!(store.snapshot("nobody").is_none());
    }

    #[test]
    fn replace_is_visible_to_subsequent_snapshots() {
        let store = PerUserStore::new(Duration::from_secs(3600));
        let corpus = UserCorpus::new(
            vec![Transaction::default()],
            vec![],
            vec![],
            VectorStore::build(Default::default(), vec![]),
        );
        store.replace("alice", corpus);
        assert!(matches!(
            store.status("alice"),
            CorpusStatus::Ready { document_count: 1, .. }
        ));
    }

    #[test]
    fn second_ingest_replaces_not_appends() {
        let store = PerUserStore::new(Duration::from_secs(3600));
        store.replace(
            "alice",
            UserCorpus::new(
                vec![Transaction::default(), Transaction::default()],
                vec![],
                vec![],
                VectorStore::build(Default::default(), vec![]),
            ),
        );
        store.replace(
            "alice",
            UserCorpus::new(vec![Transaction::default()], vec![], vec![], VectorStore::build(Default::default(), vec![])),
        );
        assert!(matches!(
            store.status("alice"),
            CorpusStatus::Ready { document_count: 1, .. }
        ));
    }

    #[test]
    fn users_are_isolated() {
        let store = PerUserStore::new(Duration::from_secs(3600));
        store.replace(
            "alice",
            UserCorpus::new(vec![Transaction::default()], vec![], vec![], VectorStore::build(Default::default(), vec![])),
        );
        assert_eq!(store.status("bob"), CorpusStatus::NotIngested);
    }
}
