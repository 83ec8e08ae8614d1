//! Seed and depth-1 page fetching.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};
use url::Url;

use super::{extract, robots};
use crate::config::ServiceConfig;
use crate::types::RagError;

/// One fetched page: final URL plus raw HTML.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub html: String,
}

/// Fetches a seed page and its same-origin links, one level deep.
///
/// robots.txt rules are fetched per origin and cached for the process
/// lifetime. Every request is bounded by the configured timeout. A failure
/// on the seed page is fatal; failures on linked pages are logged and
/// skipped.
pub struct PageFetcher {
    client: Client,
    user_agent: String,
    max_linked_pages: usize,
    robots_cache: Mutex<HashMap<String, Arc<robots::RobotsRules>>>,
}

impl PageFetcher {
    pub fn new(config: &ServiceConfig) -> Result<Self, RagError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.fetch_timeout)
            .use_rustls_tls()
            .build()?;
        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            max_linked_pages: config.max_linked_pages,
            robots_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Fetches the seed page plus the same-origin pages it links to.
    ///
    /// The traversal is an explicit two-level loop: the seed first, then each
    /// discovered link exactly once, no recursion. The seed page is always
    /// the first entry of the result.
    pub async fn fetch_with_links(&self, seed: &Url) -> Result<Vec<FetchedPage>, RagError> {
        let rules = self.rules_for(seed).await;
        if !rules.is_allowed(&self.user_agent, seed.path()) {
            return Err(RagError::RobotsDisallowed(seed.to_string()));
        }

        let seed_html = self.fetch_page(seed).await?;
        let links = extract::extract_links(&seed_html, seed, self.max_linked_pages)?;
        debug!(url = %seed, links = links.len(), "seed fetched");

        let mut pages = vec![FetchedPage {
            url: seed.clone(),
            html: seed_html,
        }];
        for link in links {
            // Links are same-origin, so the seed's robots rules apply.
            if !rules.is_allowed(&self.user_agent, link.path()) {
                warn!(url = %link, "linked page disallowed by robots.txt, skipping");
                continue;
            }
            match self.fetch_page(&link).await {
                Ok(html) => pages.push(FetchedPage { url: link, html }),
                Err(err) => {
                    warn!(url = %link, error = %err, "linked page fetch failed, skipping");
                }
            }
        }
        Ok(pages)
    }

    async fn fetch_page(&self, url: &Url) -> Result<String, RagError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("text/html") {
            return Err(RagError::UnsupportedContentType(content_type));
        }

        Ok(response.text().await?)
    }

    async fn rules_for(&self, url: &Url) -> Arc<robots::RobotsRules> {
        // robots.txt scope is the origin, so the cache keys on scheme,
        // host, and port together.
        let origin = url.origin().ascii_serialization();
        {
            // Guard must drop before the fetch below awaits.
            let cache = self.robots_cache.lock();
            if let Some(rules) = cache.get(&origin) {
                return rules.clone();
            }
        }
        let rules = Arc::new(robots::fetch_rules(&self.client, url).await);
        self.robots_cache.lock().insert(origin, rules.clone());
        rules
    }
}
