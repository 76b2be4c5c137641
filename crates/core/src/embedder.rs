//! `Embedder` — the seam `txrag-rag` implements against (spec §4.1).
//!
//! Kept in `txrag-core` so a future model-backed implementation can depend
//! on the trait alone, the way the teacher's `voice_agent_core::traits`
//! hosts `Retriever`/`LanguageModel` for the crates that implement them.

use crate::error::Result;

pub trait Embedder: Send + Sync {
    /// Embed a batch of canonical document texts. Implementations accept
    /// arbitrary-size lists; chunking into the model's batch size is an
    /// implementation detail (spec §4.1).
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query string.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Output vector dimension.
    fn dim(&self) -> usize;
}
