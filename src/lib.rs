//! ```text
//! POST /url-parser ──► scrape::PageFetcher ──► scrape::extract ──► chunker
//!                           (robots gate,                            │
//!                            depth-1 links)                          ▼
//!                                              embeddings::EmbeddingProvider
//!                                                                    │
//!                                          store::SqliteChunkStore ◄─┘
//!
//! POST /query ──► embeddings ──► store::VectorIndex::search ─┬─► generation
//!                                                            │        │
//!                                     "no relevant results" ◄┘        ▼
//!                                                               answer JSON
//! ```

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod generation;
pub mod scrape;
pub mod service;
pub mod store;
pub mod types;

pub use config::ServiceConfig;
pub use types::RagError;
