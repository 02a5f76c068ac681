// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Breadth-first traversal from the seed URL (plus sitemap URLs)
// - Every normalized URL is fetched at most once
// - Same-host restriction when following links
// - Optional page and depth caps, optional whole-crawl deadline
// - A bounded number of concurrent fetches
//
// Submodules:
// - frontier: URL identity, the pending queue and the visited-set
// - scheduler: the loop that dispatches page analyses
// =============================================================================

mod frontier;
mod scheduler;

pub use frontier::{normalize_url, Admission, Frontier, UrlRecord};
pub use scheduler::{crawl, CrawlOutput};
