//! Embedding providers.
//!
//! The service embeds both ingested chunks and incoming queries through one
//! [`EmbeddingProvider`] instance; mixing models between ingestion and query
//! time makes retrieval distances meaningless.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use crate::types::RagError;

#[cfg(feature = "bert-models")]
pub mod bert;

/// Maps text to fixed-dimension float vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a batch of texts, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Dimensionality of every vector this provider produces.
    fn dimensions(&self) -> usize;

    /// Stable identifier used in logs.
    fn id(&self) -> &str;

    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Model("embedding provider returned no vector".to_string()))
    }
}

/// Deterministic lexical embedder.
///
/// Tokens are hashed into a fixed number of buckets; the bucket counts form
/// the vector, L2-normalized. Texts sharing vocabulary land close under
/// cosine distance, which keeps retrieval meaningful in builds without a
/// native model runtime. The same input always yields the same vector.
#[derive(Clone, Debug)]
pub struct TokenHashEmbedder {
    dims: usize,
}

impl TokenHashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dims];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let token = token.to_lowercase();
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dims as u64) as usize;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for TokenHashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn id(&self) -> &str {
        "token-hash"
    }
}
