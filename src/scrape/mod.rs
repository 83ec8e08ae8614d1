//! Page acquisition: robots gating, seed + depth-1 fetching, and HTML
//! text/link extraction.

pub mod extract;
pub mod fetch;
pub mod robots;

pub use extract::{extract_links, extract_text};
pub use fetch::{FetchedPage, PageFetcher};
pub use robots::RobotsRules;
