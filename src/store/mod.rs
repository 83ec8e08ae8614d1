//! Vector index storage.
//!
//! [`VectorIndex`] is the narrow interface the service layer talks to;
//! [`sqlite::SqliteChunkStore`] implements it over SQLite with the
//! sqlite-vec extension.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::RagError;

pub use sqlite::SqliteChunkStore;

/// One stored chunk: text, provenance, and its embedding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique identifier, generated at creation.
    pub id: String,
    /// URL of the scrape that produced this chunk.
    pub source_url: String,
    /// Zero-based position of this chunk within its scrape.
    pub chunk_index: usize,
    /// The chunk text.
    pub content: String,
    /// The embedding vector, if computed.
    pub embedding: Option<Vec<f32>>,
}

impl ChunkRecord {
    pub fn new(
        source_url: impl Into<String>,
        chunk_index: usize,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_url: source_url.into(),
            chunk_index,
            content: content.into(),
            embedding: None,
        }
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// A retrieval hit: the chunk plus its cosine similarity to the query.
#[derive(Clone, Debug)]
pub struct ScoredChunk {
    pub record: ChunkRecord,
    pub similarity: f32,
}

/// Nearest-neighbor index over chunk embeddings.
///
/// Entries are only ever inserted or destroyed wholesale; there is no update
/// or delete-by-key path.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Appends records, returning how many were stored.
    ///
    /// Duplicate content is allowed. Every record must carry non-empty
    /// `content` and an embedding of the index dimensionality.
    async fn insert_chunks(&self, chunks: Vec<ChunkRecord>) -> Result<usize, RagError>;

    /// Returns up to `top_k` records nearest to `query`, best first.
    ///
    /// An empty index yields an empty result, never an error.
    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, RagError>;

    /// Total number of stored chunks.
    async fn count(&self) -> Result<usize, RagError>;

    /// Destroys all persisted state.
    ///
    /// Idempotent: a second call is a no-op. Afterwards every other
    /// operation fails with a storage-unavailable error.
    async fn teardown(&self) -> Result<(), RagError>;
}
