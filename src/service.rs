//! HTTP service layer: shared state, request handlers, error mapping.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::chunker::chunk_text;
use crate::config::ServiceConfig;
use crate::embeddings::EmbeddingProvider;
use crate::generation::GenerationProvider;
use crate::scrape::PageFetcher;
use crate::store::{ChunkRecord, VectorIndex};
use crate::types::RagError;

/// Long-lived resources shared by both handlers.
///
/// Constructed once at startup and injected into the router; handlers never
/// reach for globals. Lifecycle: init once, shared read/insert access while
/// serving, teardown once at exit.
pub struct AppState {
    pub config: ServiceConfig,
    pub fetcher: PageFetcher,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub responder: Arc<dyn GenerationProvider>,
    pub index: Arc<dyn VectorIndex>,
}

/// Builds the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/url-parser", post(scrape_url))
        .route("/query", post(query_index))
        .with_state(state)
}

/// Tears down the index at process exit.
///
/// Best-effort: failures are logged, never raised, because the process is
/// exiting regardless. Safe to call more than once.
pub async fn shutdown(state: &AppState) {
    if state.config.persist_index {
        info!("persist_index set; leaving stored chunks in place");
        return;
    }
    if let Err(err) = state.index.teardown().await {
        warn!(error = %err, "index teardown failed");
    }
}

#[derive(Debug, Deserialize)]
pub struct UrlInput {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryInput {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub message: String,
    pub url: String,
    pub chunks_stored: usize,
}

/// Outcome of a query: an answer over retrieved context, or an explicit
/// no-relevant-results variant when the index has nothing close.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Answer {
        query: String,
        retrieved_context: String,
        response: String,
    },
    NoMatch {
        query: String,
        message: String,
    },
}

/// Client-visible error wrapper mapping the pipeline taxonomy onto statuses.
pub struct ApiError(RagError);

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RagError::RobotsDisallowed(_) => StatusCode::FORBIDDEN,
            RagError::Fetch(_)
            | RagError::UnsupportedContentType(_)
            | RagError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "ragserve is running" }))
}

/// `POST /url-parser`: scrape a page and its depth-1 links into the index.
async fn scrape_url(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UrlInput>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let seed = parse_seed_url(&payload.url)?;
    info!(url = %seed, "scrape started");

    let pages = state.fetcher.fetch_with_links(&seed).await?;

    let mut text = String::new();
    for page in &pages {
        let extracted = crate::scrape::extract_text(&page.html)?;
        if !text.is_empty() && !extracted.is_empty() {
            text.push(' ');
        }
        text.push_str(&extracted);
    }
    info!(url = %seed, pages = pages.len(), characters = text.chars().count(), "text extracted");

    let chunks = chunk_text(&text, state.config.chunk_window);
    if chunks.is_empty() {
        info!(url = %seed, "no extractable text, nothing stored");
        return Ok(Json(ScrapeResponse {
            message: "Web scraping completed; no extractable text was found.".to_string(),
            url: payload.url,
            chunks_stored: 0,
        }));
    }

    let embeddings = state.embedder.embed_batch(&chunks).await?;
    let records: Vec<ChunkRecord> = chunks
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(idx, (content, embedding))| {
            ChunkRecord::new(seed.to_string(), idx, content).with_embedding(embedding)
        })
        .collect();
    let stored = state.index.insert_chunks(records).await?;

    info!(url = %seed, chunks = stored, "scrape completed");
    Ok(Json(ScrapeResponse {
        message: "Web scraping completed successfully.".to_string(),
        url: payload.url,
        chunks_stored: stored,
    }))
}

/// `POST /query`: retrieve the nearest chunks and generate an answer.
async fn query_index(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryInput>,
) -> Result<Json<QueryResponse>, ApiError> {
    info!(query = %payload.query, "query started");

    let query_vector = state.embedder.embed(&payload.query).await?;
    let hits = state
        .index
        .search(&query_vector, state.config.top_k)
        .await?;

    if hits.is_empty() {
        info!("no relevant results");
        return Ok(Json(QueryResponse::NoMatch {
            query: payload.query,
            message: "No relevant results found.".to_string(),
        }));
    }

    let retrieved_context = hits
        .iter()
        .map(|hit| hit.record.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let response = state
        .responder
        .generate(&payload.query, &retrieved_context)
        .await?;

    info!(hits = hits.len(), "query answered");
    Ok(Json(QueryResponse::Answer {
        query: payload.query,
        retrieved_context,
        response,
    }))
}

fn parse_seed_url(raw: &str) -> Result<Url, RagError> {
    let url = Url::parse(raw).map_err(|err| RagError::InvalidUrl(format!("{raw}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(RagError::InvalidUrl(format!(
            "{raw}: only http and https are supported"
        )));
    }
    if url.host_str().is_none() {
        return Err(RagError::InvalidUrl(format!("{raw}: missing host")));
    }
    Ok(url)
}
