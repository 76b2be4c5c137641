//! Retrieval and aggregation core of the transaction-RAG engine: per-user
//! corpus storage, deterministic embeddings, rule-based filter extraction,
//! query-mode classification, and the retrieval/aggregation kernel that
//! each mode dispatches to (spec §4.1–§4.6).

pub mod answer;
pub mod classifier;
pub mod embeddings;
pub mod filter_extractor;
pub mod kernel;
pub mod language;
pub mod user_store;
pub mod vector_store;

pub use answer::generate_answer;
pub use classifier::classify;
pub use embeddings::{DeterministicEmbedder, EmbeddingConfig};
pub use filter_extractor::extract_filters;
pub use kernel::{run_kernel, KernelOutput};
pub use language::{detect_language, Language};
pub use user_store::{CorpusStatus, PerUserStore, UserCorpus};
pub use vector_store::{resolve, CollectionInfo, VectorSearchResult, VectorStore, VectorStoreConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("vector store error: {0}")]
    VectorStore(String),

    #[error("search error: {0}")]
    Search(String),
}

impl From<RagError> for txrag_core::Error {
    fn from(err: RagError) -> Self {
        txrag_core::Error::Internal(err.to_string())
    }
}
