// src/crawl/frontier.rs
// =============================================================================
// The crawl frontier: URLs waiting to be fetched, plus the visited-set.
//
// Identity of a URL is its normalized form (see normalize_url). A URL is
// admitted only if that identity has never been queued or visited, so the
// same page can never be dispatched twice. pop() moves the identity into the
// visited-set at the moment the URL leaves the queue.
//
// The optional caps (max pages, max depth) are checked here, at enqueue time,
// independently of how the scheduler drives the queue.
//
// Rust concepts:
// - VecDeque: FIFO queue, which makes the traversal breadth-first
// - HashSet: O(1) identity checks
// =============================================================================

use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL waiting in (or taken from) the frontier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    /// The URL to request (fragment removed)
    pub url: Url,
    /// Normalized identity, see normalize_url
    pub key: String,
    /// 0 for the seed URL and sitemap entries
    pub depth: usize,
    /// The page (or sitemap) the URL was found on
    pub referrer: Option<String>,
    /// Position in discovery order, assigned on admission
    pub index: usize,
}

impl UrlRecord {
    pub fn new(mut url: Url, depth: usize, referrer: Option<String>) -> Self {
        url.set_fragment(None);
        let key = normalize_url(&url);
        Self {
            url,
            key,
            depth,
            referrer,
            index: 0,
        }
    }

    pub fn seed(url: Url) -> Self {
        Self::new(url, 0, None)
    }
}

// Normalizes a URL into its crawl identity
//
// - scheme and host lower-cased, default port dropped (the url crate does this
//   when parsing)
// - fragment removed
// - trailing slash removed from any path other than "/"
// - an empty query ("?") removed
//
// Examples:
//   "HTTPS://Example.com:443/docs/#intro" -> "https://example.com/docs"
//   "https://example.com"                 -> "https://example.com/"
pub fn normalize_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
        let trimmed = trimmed.to_string();
        url.set_path(&trimmed);
    }

    url.to_string()
}

/// Result of offering a URL to the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Queued,
    /// Already queued or visited
    Duplicate,
    PageLimit,
    DepthLimit,
}

#[derive(Debug, Default)]
pub struct Frontier {
    pending: VecDeque<UrlRecord>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    admitted: usize,
    max_pages: Option<usize>,
    max_depth: Option<usize>,
    refused_by_page_limit: usize,
    refused_by_depth_limit: usize,
}

impl Frontier {
    pub fn new(max_pages: Option<usize>, max_depth: Option<usize>) -> Self {
        Self {
            max_pages,
            max_depth,
            ..Self::default()
        }
    }

    /// Offers a URL. It is queued only if its identity is new and the caps
    /// allow it; the record's discovery index is assigned here.
    pub fn push(&mut self, mut record: UrlRecord) -> Admission {
        if self.visited.contains(&record.key) || self.queued.contains(&record.key) {
            return Admission::Duplicate;
        }

        if self.max_depth.is_some_and(|max| record.depth > max) {
            self.refused_by_depth_limit += 1;
            return Admission::DepthLimit;
        }

        if self.max_pages.is_some_and(|max| self.admitted >= max) {
            self.refused_by_page_limit += 1;
            return Admission::PageLimit;
        }

        record.index = self.admitted;
        self.admitted += 1;
        self.queued.insert(record.key.clone());
        self.pending.push_back(record);
        Admission::Queued
    }

    /// Takes the oldest pending URL and marks it visited.
    pub fn pop(&mut self) -> Option<UrlRecord> {
        let record = self.pending.pop_front()?;
        self.queued.remove(&record.key);
        self.visited.insert(record.key.clone());
        Some(record)
    }

    /// Records an identity reached some other way (the target of a redirect).
    /// A pending entry with the same identity is dropped, since its content
    /// has just been fetched. Returns false if it was already visited.
    pub fn mark_visited(&mut self, key: &str) -> bool {
        if self.queued.remove(key) {
            self.pending.retain(|r| r.key != key);
        }
        self.visited.insert(key.to_string())
    }

    pub fn is_visited(&self, key: &str) -> bool {
        self.visited.contains(key)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn refused_by_page_limit(&self) -> usize {
        self.refused_by_page_limit
    }

    pub fn refused_by_depth_limit(&self) -> usize {
        self.refused_by_depth_limit
    }
}
