// src/error.rs
// =============================================================================
// Error types for the analyzer.
//
// Only ConfigError ever stops a crawl, and it does so before the first request
// goes out. FetchError and SitemapError are absorbed into the report: a page
// that failed still gets a PageReport (with its `error` field set) and a bad
// sitemap becomes a site-level warning.
//
// FetchError is Serialize because it is stored inside PageReport and ends up
// in the JSON output.
// =============================================================================

use serde::Serialize;
use thiserror::Error;

/// Invalid caller input. Fatal, raised before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid seed URL '{url}': {reason}")]
    InvalidSeedUrl { url: String, reason: String },

    #[error("unsupported URL scheme '{scheme}' (only http and https can be crawled)")]
    UnsupportedScheme { scheme: String },

    #[error("seed URL has no host: {0}")]
    MissingHost(String),

    #[error("invalid value for {name}: {reason}")]
    InvalidLimit { name: &'static str, reason: String },

    #[error("invalid extra-tag selector '{selector}'")]
    InvalidSelector { selector: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Why fetching a single page failed. Recorded per page, the crawl continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("could not resolve hostname: {message}")]
    Dns { message: String },

    #[error("connection failed: {message}")]
    Connect { message: String },

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("not an HTML page (content-type: {content_type})")]
    NotHtml { content_type: String },

    #[error("failed to read response body: {message}")]
    Body { message: String },

    #[error("{message}")]
    Other { message: String },
}

/// An unusable sitemap. Becomes a site warning; the crawl goes on from the seed.
#[derive(Debug, Clone, Error)]
pub enum SitemapError {
    #[error("invalid sitemap URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to fetch sitemap: {0}")]
    Fetch(#[from] FetchError),

    #[error("malformed sitemap: {0}")]
    Malformed(String),

    #[error("sitemap contains no URLs")]
    Empty,
}
