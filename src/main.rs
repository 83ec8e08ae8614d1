//! ragserve binary: eager model and store initialization, axum serving,
//! index teardown at exit.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use ragserve::config::ServiceConfig;
use ragserve::embeddings::EmbeddingProvider;
use ragserve::generation::GenerationProvider;
use ragserve::scrape::PageFetcher;
use ragserve::service::{self, AppState};
use ragserve::store::SqliteChunkStore;
use ragserve::types::RagError;

#[tokio::main]
async fn main() -> Result<(), RagError> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServiceConfig::from_env()?;

    // Models load before the listener binds so a bad model path fails here,
    // not inside the first request.
    let (embedder, responder) = build_providers(&config).await?;
    info!(embedder = embedder.id(), responder = responder.id(), "models ready");

    let index = Arc::new(SqliteChunkStore::open(&config.data_dir, embedder.dimensions()).await?);
    info!(dir = %config.data_dir.display(), "chunk store open");

    let fetcher = PageFetcher::new(&config)?;
    let state = Arc::new(AppState {
        config: config.clone(),
        fetcher,
        embedder,
        responder,
        index,
    });

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, service::router(state.clone()).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service::shutdown(&state).await;
    info!("shutdown complete");
    Ok(())
}

#[cfg(feature = "bert-models")]
async fn build_providers(
    config: &ServiceConfig,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn GenerationProvider>), RagError> {
    use ragserve::embeddings::bert::SentenceEmbedder;
    use ragserve::generation::bert::SummarizationResponder;

    let embed_dir = config.embed_model_dir.as_ref().ok_or_else(|| {
        RagError::Config(
            "RAGSERVE_EMBED_MODEL_DIR must point at a sentence-embedding model directory"
                .to_string(),
        )
    })?;
    let gen_dir = config.gen_model_dir.as_ref().ok_or_else(|| {
        RagError::Config(
            "RAGSERVE_GEN_MODEL_DIR must point at a summarization model directory".to_string(),
        )
    })?;

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(SentenceEmbedder::spawn(embed_dir).await?);
    let responder: Arc<dyn GenerationProvider> =
        Arc::new(SummarizationResponder::spawn(gen_dir, config.max_context_chars).await?);
    Ok((embedder, responder))
}

#[cfg(not(feature = "bert-models"))]
async fn build_providers(
    config: &ServiceConfig,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn GenerationProvider>), RagError> {
    use ragserve::embeddings::TokenHashEmbedder;
    use ragserve::generation::ExtractiveResponder;

    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(TokenHashEmbedder::new(config.embed_dims));
    let responder: Arc<dyn GenerationProvider> =
        Arc::new(ExtractiveResponder::new(config.max_context_chars));
    Ok((embedder, responder))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
