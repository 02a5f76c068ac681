// src/analyzer/mod.rs
// =============================================================================
// Per-page analysis.
//
// Submodules:
// - fetch: HTTP(S) GET with timeout, redirect policy and error categorization
// - page: turns one fetched page into a PageReport
// =============================================================================

mod fetch;
mod page;

pub use fetch::{FetchedPage, Fetcher};
pub use page::{PageAnalyzer, PageOutcome, PageReport, PageWarning};
