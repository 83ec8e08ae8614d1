//! SQLite-backed chunk store with sqlite-vec similarity search.

use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio_rusqlite::{Connection, ffi};
use tracing::warn;

use super::{ChunkRecord, ScoredChunk, VectorIndex};
use crate::types::RagError;

const DB_FILE: &str = "chunks.sqlite";

/// Chunk store persisted under a dedicated directory.
///
/// The sqlite-vec extension supplies `vec_f32` and `vec_distance_cosine`; it
/// is registered process-wide once before the first connection opens. All
/// statements execute on the connection's single worker thread, so
/// concurrent inserts from parallel scrape requests are serialized without
/// extra locking.
pub struct SqliteChunkStore {
    conn: Connection,
    data_dir: PathBuf,
    dims: usize,
    torn_down: AtomicBool,
}

impl SqliteChunkStore {
    /// Opens (creating if needed) the store under `data_dir` for vectors of
    /// `dims` dimensions.
    pub async fn open(data_dir: impl AsRef<Path>, dims: usize) -> Result<Self, RagError> {
        Self::register_sqlite_vec()?;

        let data_dir = data_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&data_dir).await?;

        let conn = Connection::open(data_dir.join(DB_FILE))
            .await
            .map_err(storage_err)?;
        conn.call(|conn| -> tokio_rusqlite::Result<()> {
            conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))
                ?;
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS chunks (
                     id TEXT PRIMARY KEY,
                     source_url TEXT NOT NULL,
                     chunk_index TEXT NOT NULL,
                     content TEXT NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS chunk_embeddings (
                     id TEXT PRIMARY KEY,
                     embedding BLOB NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source_url);",
            )
            ?;
            Ok(())
        })
        .await
        .map_err(storage_err)?;

        Ok(Self {
            conn,
            data_dir,
            dims,
            torn_down: AtomicBool::new(false),
        })
    }

    /// Directory holding the persisted database.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn ensure_open(&self) -> Result<(), RagError> {
        if self.torn_down.load(Ordering::SeqCst) {
            return Err(RagError::Storage("chunk store has been torn down".to_string()));
        }
        Ok(())
    }

    fn register_sqlite_vec() -> Result<(), RagError> {
        use std::sync::Mutex;

        static INIT: Once = Once::new();
        static INIT_RESULT: Mutex<Option<Result<(), String>>> = Mutex::new(None);

        INIT.call_once(|| {
            let result = unsafe {
                type SqliteExtensionInit = unsafe extern "C" fn(
                    *mut ffi::sqlite3,
                    *mut *mut c_char,
                    *const ffi::sqlite3_api_routines,
                ) -> i32;

                let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
                let init_fn: SqliteExtensionInit =
                    std::mem::transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
                let rc = ffi::sqlite3_auto_extension(Some(init_fn));
                if rc != 0 {
                    Err(format!("failed to register sqlite-vec extension (code {rc})"))
                } else {
                    Ok(())
                }
            };
            *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
        });

        INIT_RESULT
            .lock()
            .expect("init result mutex poisoned")
            .clone()
            .expect("init was called but result not set")
            .map_err(RagError::Storage)
    }
}

#[async_trait]
impl VectorIndex for SqliteChunkStore {
    async fn insert_chunks(&self, chunks: Vec<ChunkRecord>) -> Result<usize, RagError> {
        self.ensure_open()?;
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut rows = Vec::with_capacity(chunks.len());
        for record in chunks {
            let Some(embedding) = record.embedding else {
                return Err(RagError::Storage(format!(
                    "chunk {} has no embedding",
                    record.id
                )));
            };
            if record.content.is_empty() {
                return Err(RagError::Storage(format!(
                    "chunk {} has empty content",
                    record.id
                )));
            }
            if embedding.len() != self.dims {
                return Err(RagError::Storage(format!(
                    "chunk {} embedding has {} dimensions, index expects {}",
                    record.id,
                    embedding.len(),
                    self.dims
                )));
            }
            let embedding_json =
                serde_json::to_string(&embedding).map_err(|err| RagError::Storage(err.to_string()))?;
            rows.push((
                record.id,
                record.source_url,
                record.chunk_index.to_string(),
                record.content,
                embedding_json,
            ));
        }

        let inserted = rows.len();
        self.conn
            .call(move |conn| -> tokio_rusqlite::Result<()> {
                let tx = conn.transaction()?;
                for (id, source_url, chunk_index, content, embedding_json) in &rows {
                    tx.execute(
                        "INSERT INTO chunks (id, source_url, chunk_index, content) \
                         VALUES (?1, ?2, ?3, ?4)",
                        [
                            id.as_str(),
                            source_url.as_str(),
                            chunk_index.as_str(),
                            content.as_str(),
                        ],
                    )
                    ?;
                    tx.execute(
                        "INSERT INTO chunk_embeddings (id, embedding) VALUES (?1, vec_f32(?2))",
                        [id.as_str(), embedding_json.as_str()],
                    )
                    ?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(storage_err)?;
        Ok(inserted)
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        self.ensure_open()?;
        if query.len() != self.dims {
            return Err(RagError::Storage(format!(
                "query vector has {} dimensions, index expects {}",
                query.len(),
                self.dims
            )));
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let embedding_json =
            serde_json::to_string(query).map_err(|err| RagError::Storage(err.to_string()))?;
        self.conn
            .call(move |conn| -> tokio_rusqlite::Result<Vec<ScoredChunk>> {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT c.id, c.source_url, c.chunk_index, c.content, \
                         vec_distance_cosine(e.embedding, vec_f32(?1)) AS distance \
                         FROM chunks c \
                         JOIN chunk_embeddings e ON c.id = e.id \
                         ORDER BY distance ASC \
                         LIMIT {top_k}"
                    ))
                    ?;

                let rows = stmt
                    .query_map([&embedding_json], |row| {
                        let record = ChunkRecord {
                            id: row.get(0)?,
                            source_url: row.get(1)?,
                            chunk_index: row.get::<_, String>(2)?.parse().unwrap_or(0),
                            content: row.get(3)?,
                            embedding: None,
                        };
                        let distance: f32 = row.get(4)?;
                        Ok(ScoredChunk {
                            record,
                            similarity: 1.0 - distance,
                        })
                    })
                    ?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row?);
                }
                Ok(results)
            })
            .await
            .map_err(storage_err)
    }

    async fn count(&self) -> Result<usize, RagError> {
        self.ensure_open()?;
        self.conn
            .call(|conn| -> tokio_rusqlite::Result<usize> {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
                    ?;
                Ok(count as usize)
            })
            .await
            .map_err(storage_err)
    }

    async fn teardown(&self) -> Result<(), RagError> {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Err(err) = self.conn.clone().close().await {
            warn!(error = %err, "closing chunk store connection failed");
        }
        match tokio::fs::remove_dir_all(&self.data_dir).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn storage_err<E: std::fmt::Display>(err: E) -> RagError {
    RagError::Storage(err.to_string())
}
