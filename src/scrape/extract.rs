//! HTML flattening and same-origin link discovery.
//!
//! Both helpers are synchronous on purpose: `scraper::Html` is not `Send`,
//! so parsing happens between await points and only owned data crosses them.

use scraper::{Html, Selector};
use url::Url;

use crate::types::RagError;

/// Flattens a page to plain text.
///
/// Paragraph (`<p>`) contents are concatenated in document order, joined
/// with single spaces; scripts, styles, and markup never reach the output.
/// A page without paragraphs yields an empty string, which is a valid
/// "no content" outcome for the caller.
pub fn extract_text(html: &str) -> Result<String, RagError> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse("p").map_err(|err| RagError::Extraction(err.to_string()))?;

    let mut paragraphs = Vec::new();
    for element in document.select(&selector) {
        let text: String = element.text().collect();
        paragraphs.push(text);
    }
    Ok(paragraphs.join(" "))
}

/// Collects same-origin link targets from a page, in document order.
///
/// Targets are resolved against `base`, restricted to http(s) URLs on the
/// same host, stripped of fragments, de-duplicated, and capped at `limit`.
/// The base page itself is excluded.
pub fn extract_links(html: &str, base: &Url, limit: usize) -> Result<Vec<Url>, RagError> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse("a[href]").map_err(|err| RagError::Extraction(err.to_string()))?;

    let mut links: Vec<Url> = Vec::new();
    for element in document.select(&selector) {
        if links.len() == limit {
            break;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if href.starts_with('#') {
            continue;
        }
        let Ok(mut url) = base.join(href) else {
            continue;
        };
        url.set_fragment(None);
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }
        if url.host_str() != base.host_str() {
            continue;
        }
        if &url == base {
            continue;
        }
        if links.iter().any(|existing| existing == &url) {
            continue;
        }
        links.push(url);
    }
    Ok(links)
}
