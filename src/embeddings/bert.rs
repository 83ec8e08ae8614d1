//! rust-bert sentence-embedding provider.
//!
//! The underlying model is not `Sync`, so it lives on one dedicated worker
//! thread behind a request channel; async callers await replies on oneshot
//! channels. The model loads eagerly so a bad path fails before the service
//! starts taking traffic.

use std::path::{Path, PathBuf};
use std::thread;

use async_trait::async_trait;
use rust_bert::pipelines::sentence_embeddings::SentenceEmbeddingsBuilder;
use tokio::sync::oneshot;

use super::EmbeddingProvider;
use crate::types::RagError;

struct EmbedJob {
    texts: Vec<String>,
    reply: oneshot::Sender<Result<Vec<Vec<f32>>, RagError>>,
}

/// Sentence-transformer embedder loaded from a local model directory
/// (all-MiniLM-L6-v2 layout, 384 dimensions).
pub struct SentenceEmbedder {
    jobs: flume::Sender<EmbedJob>,
    dims: usize,
}

impl SentenceEmbedder {
    /// Loads the model on a dedicated worker thread and waits until it is
    /// ready to serve.
    pub async fn spawn(model_dir: &Path) -> Result<Self, RagError> {
        let (jobs_tx, jobs_rx) = flume::unbounded::<EmbedJob>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<usize, RagError>>();
        let dir = model_dir.to_path_buf();

        thread::Builder::new()
            .name("sentence-embedder".to_string())
            .spawn(move || embed_worker(dir, jobs_rx, ready_tx))
            .map_err(|err| RagError::Model(err.to_string()))?;

        let dims = ready_rx
            .await
            .map_err(|_| RagError::Model("embedding worker exited during startup".to_string()))??;
        Ok(Self { jobs: jobs_tx, dims })
    }
}

fn embed_worker(
    dir: PathBuf,
    jobs: flume::Receiver<EmbedJob>,
    ready: oneshot::Sender<Result<usize, RagError>>,
) {
    let model = match SentenceEmbeddingsBuilder::local(dir).create_model() {
        Ok(model) => model,
        Err(err) => {
            let _ = ready.send(Err(RagError::Model(err.to_string())));
            return;
        }
    };
    let dims = match model.get_embedding_dim() {
        Ok(dims) => dims as usize,
        Err(err) => {
            let _ = ready.send(Err(RagError::Model(err.to_string())));
            return;
        }
    };
    if ready.send(Ok(dims)).is_err() {
        return;
    }

    // Runs until every sender is dropped, which ends the thread.
    while let Ok(EmbedJob { texts, reply }) = jobs.recv() {
        let result = model
            .encode(&texts)
            .map_err(|err| RagError::Model(err.to_string()));
        let _ = reply.send(result);
    }
}

#[async_trait]
impl EmbeddingProvider for SentenceEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.jobs
            .send(EmbedJob {
                texts: texts.to_vec(),
                reply: reply_tx,
            })
            .map_err(|_| RagError::Model("embedding worker is gone".to_string()))?;
        reply_rx
            .await
            .map_err(|_| RagError::Model("embedding worker dropped the request".to_string()))?
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn id(&self) -> &str {
        "sentence-bert"
    }
}
