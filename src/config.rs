//! Environment-driven service configuration.
//!
//! Every knob resolves from a `RAGSERVE_*` environment variable with a
//! sensible default; `.env` files are honored via dotenvy.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::RagError;

/// Resolved configuration shared by the binary and the service layer.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,
    /// Directory holding the persisted chunk index. Deleted wholesale at
    /// shutdown unless `persist_index` is set.
    pub data_dir: PathBuf,
    /// User agent for page and robots.txt requests.
    pub user_agent: String,
    /// Bound on every outbound fetch.
    pub fetch_timeout: Duration,
    /// Cap on same-origin links followed from the seed page.
    pub max_linked_pages: usize,
    /// Chunk window in characters.
    pub chunk_window: usize,
    /// Number of nearest chunks retrieved per query.
    pub top_k: usize,
    /// Character budget for context handed to the responder.
    pub max_context_chars: usize,
    /// Embedding dimensionality for the default lexical embedder. Builds
    /// with `bert-models` take the dimensionality from the loaded model.
    pub embed_dims: usize,
    /// Keep the index across restarts instead of tearing it down at exit.
    pub persist_index: bool,
    /// Sentence-embedding model directory (`bert-models` builds).
    pub embed_model_dir: Option<PathBuf>,
    /// Summarization model directory (`bert-models` builds).
    pub gen_model_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            data_dir: PathBuf::from("./ragserve_data"),
            user_agent: concat!("ragserve/", env!("CARGO_PKG_VERSION")).to_string(),
            fetch_timeout: Duration::from_secs(10),
            max_linked_pages: 3,
            chunk_window: 512,
            top_k: 3,
            max_context_chars: 2048,
            embed_dims: 384,
            persist_index: false,
            embed_model_dir: None,
            gen_model_dir: None,
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, RagError> {
        dotenvy::dotenv().ok();
        Self::resolve(|key| std::env::var(key).ok())
    }

    fn resolve(get: impl Fn(&str) -> Option<String>) -> Result<Self, RagError> {
        let defaults = Self::default();
        Ok(Self {
            bind_addr: parse_var("RAGSERVE_BIND_ADDR", get("RAGSERVE_BIND_ADDR"), defaults.bind_addr)?,
            data_dir: get("RAGSERVE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            user_agent: get("RAGSERVE_USER_AGENT").unwrap_or(defaults.user_agent),
            fetch_timeout: Duration::from_secs(parse_var(
                "RAGSERVE_FETCH_TIMEOUT_SECS",
                get("RAGSERVE_FETCH_TIMEOUT_SECS"),
                defaults.fetch_timeout.as_secs(),
            )?),
            max_linked_pages: parse_var(
                "RAGSERVE_MAX_LINKED_PAGES",
                get("RAGSERVE_MAX_LINKED_PAGES"),
                defaults.max_linked_pages,
            )?,
            chunk_window: parse_var(
                "RAGSERVE_CHUNK_WINDOW",
                get("RAGSERVE_CHUNK_WINDOW"),
                defaults.chunk_window,
            )?,
            top_k: parse_var("RAGSERVE_TOP_K", get("RAGSERVE_TOP_K"), defaults.top_k)?,
            max_context_chars: parse_var(
                "RAGSERVE_MAX_CONTEXT_CHARS",
                get("RAGSERVE_MAX_CONTEXT_CHARS"),
                defaults.max_context_chars,
            )?,
            embed_dims: parse_var(
                "RAGSERVE_EMBED_DIMS",
                get("RAGSERVE_EMBED_DIMS"),
                defaults.embed_dims,
            )?,
            persist_index: parse_flag(get("RAGSERVE_PERSIST_INDEX"), defaults.persist_index),
            embed_model_dir: get("RAGSERVE_EMBED_MODEL_DIR").map(PathBuf::from),
            gen_model_dir: get("RAGSERVE_GEN_MODEL_DIR").map(PathBuf::from),
        })
    }
}

fn parse_var<T>(key: &str, raw: Option<String>, default: T) -> Result<T, RagError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|err| RagError::Config(format!("invalid {key} '{raw}': {err}"))),
        None => Ok(default),
    }
}

fn parse_flag(raw: Option<String>, default: bool) -> bool {
    raw.map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}
