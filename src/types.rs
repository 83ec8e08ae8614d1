//! Shared error taxonomy for the scrape → embed → retrieve pipeline.

use thiserror::Error;

/// Errors surfaced by the pipeline and its storage/model backends.
///
/// Seed-page failures and model failures abort the current request; fetch
/// failures for linked pages are logged and skipped by the caller instead.
#[derive(Debug, Error)]
pub enum RagError {
    /// Network failure or non-success HTTP status while fetching a page.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// robots.txt forbids scraping the requested path.
    #[error("scraping disallowed by robots.txt: {0}")]
    RobotsDisallowed(String),

    /// The response body is not HTML.
    #[error("unsupported content type '{0}': only HTML pages can be scraped")]
    UnsupportedContentType(String),

    /// The supplied URL could not be parsed or uses an unsupported scheme.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// HTML could not be processed into text or links.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Embedding or generation inference failed.
    #[error("model inference failed: {0}")]
    Model(String),

    /// The vector store rejected an operation or is unavailable.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        RagError::Fetch(err.to_string())
    }
}
