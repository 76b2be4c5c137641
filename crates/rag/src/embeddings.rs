//! Deterministic embeddings.
//!
//! The engine never trains or loads a model (spec §4.1 Non-goals): this is
//! a character-hash embedder, stable across runs and across process
//! restarts, good enough to rank "similar wording" above "unrelated
//! wording" without needing model weights anywhere in the stack.

use txrag_core::{Embedder, Error, Result};

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub embedding_dim: usize,
    pub normalize: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 384,
            normalize: true,
        }
    }
}

/// Hash-based embedder: each character folds into one dimension by
/// `(char as usize + position) % dim`, then the vector is L2-normalized.
/// Identical text always yields an identical vector; similar text (shared
/// substrings, shared character runs) yields vectors with nonzero cosine
/// similarity, which is all `VECTOR_SEARCH` mode needs (spec §4.1, §4.6).
pub struct DeterministicEmbedder {
    config: EmbeddingConfig,
}

impl DeterministicEmbedder {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { config }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.config.embedding_dim];

        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % self.config.embedding_dim;
            embedding[idx] += 1.0;
        }

        if self.config.normalize {
            let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for v in &mut embedding {
                    *v /= norm;
                }
            }
        }

        embedding
    }
}

impl Embedder for DeterministicEmbedder {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(Error::Internal("embed_documents called with no texts".to_string()));
        }
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_one(text))
    }

    fn dim(&self) -> usize {
        self.config.embedding_dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_is_normalized_and_sized() {
        let embedder = DeterministicEmbedder::new(EmbeddingConfig::default());
        let v = embedder.embed_query("coffee purchase at starbucks");
        assert_eq!(v.len(), 384);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[test]
    fn same_text_embeds_identically() {
        let embedder = DeterministicEmbedder::new(EmbeddingConfig::default());
        assert_eq!(
            embedder.embed_query("upi payment"),
            embedder.embed_query("upi payment")
        );
    }

    #[test]
    fn rejects_empty_document_batch() {
        let embedder = DeterministicEmbedder::new(EmbeddingConfig::default());
        assert!(embedder.embed_documents(&[]).is_err());
    }
}
