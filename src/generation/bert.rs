//! rust-bert summarization responder.
//!
//! Same worker-thread arrangement as the sentence embedder: the pipeline is
//! not `Sync`, so one dedicated thread owns it and serves requests over a
//! channel. Input follows the T5 text-to-text convention of prefixing the
//! task, here `question: <query> context: <context>`.

use std::path::{Path, PathBuf};
use std::thread;

use async_trait::async_trait;
use rust_bert::pipelines::common::{ModelResource, ModelType};
use rust_bert::pipelines::summarization::{SummarizationConfig, SummarizationModel};
use rust_bert::resources::LocalResource;
use tokio::sync::oneshot;

use super::{GenerationProvider, truncate_context};
use crate::types::RagError;

struct GenerateJob {
    input: String,
    reply: oneshot::Sender<Result<String, RagError>>,
}

/// Seq2seq responder loaded from a local model directory (T5-small layout).
pub struct SummarizationResponder {
    jobs: flume::Sender<GenerateJob>,
    max_context_chars: usize,
}

impl SummarizationResponder {
    /// Loads the model on a dedicated worker thread and waits until it is
    /// ready to serve.
    pub async fn spawn(model_dir: &Path, max_context_chars: usize) -> Result<Self, RagError> {
        let (jobs_tx, jobs_rx) = flume::unbounded::<GenerateJob>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), RagError>>();
        let dir = model_dir.to_path_buf();

        thread::Builder::new()
            .name("summarization-responder".to_string())
            .spawn(move || generate_worker(dir, jobs_rx, ready_tx))
            .map_err(|err| RagError::Model(err.to_string()))?;

        ready_rx
            .await
            .map_err(|_| RagError::Model("generation worker exited during startup".to_string()))??;
        Ok(Self {
            jobs: jobs_tx,
            max_context_chars,
        })
    }
}

fn generate_worker(
    dir: PathBuf,
    jobs: flume::Receiver<GenerateJob>,
    ready: oneshot::Sender<Result<(), RagError>>,
) {
    let weights = LocalResource {
        local_path: dir.join("rust_model.ot"),
    };
    let model_config = LocalResource {
        local_path: dir.join("config.json"),
    };
    let vocab = LocalResource {
        local_path: dir.join("spiece.model"),
    };

    let mut config = SummarizationConfig::new(
        ModelType::T5,
        ModelResource::Torch(Box::new(weights)),
        model_config,
        vocab,
        None::<LocalResource>,
    );
    config.max_length = Some(170);
    config.num_beams = 1;

    let model = match SummarizationModel::new(config) {
        Ok(model) => model,
        Err(err) => {
            let _ = ready.send(Err(RagError::Model(err.to_string())));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }

    while let Ok(GenerateJob { input, reply }) = jobs.recv() {
        let result = model
            .summarize(&[input.as_str()])
            .map_err(|err| RagError::Model(err.to_string()))
            .and_then(|mut outputs| {
                outputs
                    .pop()
                    .ok_or_else(|| RagError::Model("generation model returned no output".to_string()))
            });
        let _ = reply.send(result);
    }
}

#[async_trait]
impl GenerationProvider for SummarizationResponder {
    async fn generate(&self, query: &str, context: &str) -> Result<String, RagError> {
        let context = truncate_context(context, self.max_context_chars);
        let input = format!("question: {query} context: {context}");

        let (reply_tx, reply_rx) = oneshot::channel();
        self.jobs
            .send(GenerateJob {
                input,
                reply: reply_tx,
            })
            .map_err(|_| RagError::Model("generation worker is gone".to_string()))?;
        reply_rx
            .await
            .map_err(|_| RagError::Model("generation worker dropped the request".to_string()))?
    }

    fn id(&self) -> &str {
        "t5-summarization"
    }
}
