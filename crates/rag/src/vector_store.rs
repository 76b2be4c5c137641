//! In-memory vector store.
//!
//! Spec §4.1/Non-goals rule out a disk-backed or distributed index: each
//! user's corpus is small enough (≤ `CORPUS_MAX_DOCS`) that brute-force
//! cosine similarity over vectors held in process memory is the right
//! fit — no Qdrant, no on-disk segment files, nothing that outlives the
//! process.

use txrag_core::Document;

#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    pub vector_dim: usize,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self { vector_dim: 384 }
    }
}

#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    pub index: usize,
    pub score: f32,
}

/// A fixed, embedded snapshot of one user's corpus: documents plus their
/// embeddings, built once at ingest and searched read-only thereafter.
pub struct VectorStore {
    config: VectorStoreConfig,
    embeddings: Vec<Vec<f32>>,
}

impl VectorStore {
    pub fn build(config: VectorStoreConfig, embeddings: Vec<Vec<f32>>) -> Self {
        Self { config, embeddings }
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Cosine-similarity search over the whole corpus, descending score,
    /// ties broken by original insertion index (spec §4.6 determinism).
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Vec<VectorSearchResult> {
        let mut scored: Vec<VectorSearchResult> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(index, emb)| VectorSearchResult {
                index,
                score: cosine_similarity(query_embedding, emb),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.index.cmp(&b.index))
        });
        scored.truncate(top_k);
        scored
    }

    pub fn info(&self) -> CollectionInfo {
        CollectionInfo {
            vectors_count: self.embeddings.len(),
            vector_dim: self.config.vector_dim,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub vectors_count: usize,
    pub vector_dim: usize,
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    let dot: f32 = (0..len).map(|i| a[i] * b[i]).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Pairs a ranked [`VectorSearchResult`] back to its source [`Document`].
pub fn resolve<'a>(results: &[VectorSearchResult], documents: &'a [Document]) -> Vec<&'a Document> {
    results
        .iter()
        .filter_map(|r| documents.get(r.index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vector_scores_highest() {
        let store = VectorStore::build(
            VectorStoreConfig { vector_dim: 3 },
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]],
        );
        let results = store.search(&[1.0, 0.0, 0.0], 3);
        assert_eq!(results[0].index, 0);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn empty_store_returns_no_results() {
        let store = VectorStore::build(VectorStoreConfig::default(), Vec::new());
        assert!(store.search(&[1.0, 0.0], 5).is_empty());
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let store = VectorStore::build(
            VectorStoreConfig { vector_dim: 2 },
            vec![vec![1.0, 0.0], vec![1.0, 0.0]],
        );
        let results = store.search(&[1.0, 0.0], 2);
        assert_eq!(results[0].index, 0);
        assert_eq!(results[1].index, 1);
    }
}
