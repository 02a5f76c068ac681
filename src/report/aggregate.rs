// src/report/aggregate.rs
// =============================================================================
// Folds per-page reports into the site report.
//
// This is a pure function of its inputs: the page reports are moved in,
// their n-gram tables are summed, ranking and truncation are applied once at
// site level, and cross-page duplicates are detected. The page reports
// themselves are kept unmodified.
//
// Pages are put back into discovery order, so a crawl with concurrent
// fetches still produces the same report on every run.
// =============================================================================

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::analyzer::PageReport;
use crate::config::CrawlConfig;
use crate::ngram::{NGramCounts, RankedTerm};

/// A site-level finding. Serialized with a `kind` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SiteWarning {
    SitemapError { url: String, message: String },
    DuplicateTitle { title: String, urls: Vec<String> },
    DuplicateDescription { description: String, urls: Vec<String> },
    /// Pages whose extracted text is identical
    DuplicateContent { urls: Vec<String> },
    DeadlineReached { unvisited: usize },
    PageLimitReached { max_pages: usize, refused: usize },
    DepthLimitReached { max_depth: usize, refused: usize },
}

impl fmt::Display for SiteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SitemapError { url, message } => write!(f, "Sitemap {}: {}", url, message),
            Self::DuplicateTitle { title, urls } => {
                write!(f, "Duplicate title '{}' on: {}", title, urls.join(", "))
            }
            Self::DuplicateDescription { description, urls } => write!(
                f,
                "Duplicate description '{}' on: {}",
                description,
                urls.join(", ")
            ),
            Self::DuplicateContent { urls } => {
                write!(f, "Duplicate content on: {}", urls.join(", "))
            }
            Self::DeadlineReached { unvisited } => write!(
                f,
                "Crawl deadline reached, {} discovered URL(s) not visited",
                unvisited
            ),
            Self::PageLimitReached { max_pages, refused } => write!(
                f,
                "Page limit of {} reached, {} URL(s) not queued",
                max_pages, refused
            ),
            Self::DepthLimitReached { max_depth, refused } => write!(
                f,
                "Depth limit of {} reached, {} URL(s) not queued",
                max_depth, refused
            ),
        }
    }
}

/// The result of analyzing a site.
#[derive(Debug, Clone, Serialize)]
pub struct SiteReport {
    pub seed_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitemap_url: Option<String>,
    pub total_pages: usize,
    pub failed_pages: usize,
    pub total_words: usize,
    /// True when the crawl was cut short by its deadline
    pub partial: bool,
    pub keywords: Vec<RankedTerm>,
    pub bigrams: Vec<RankedTerm>,
    pub trigrams: Vec<RankedTerm>,
    pub warnings: Vec<SiteWarning>,
    pub pages: Vec<PageReport>,
}

impl SiteReport {
    pub fn has_failures(&self) -> bool {
        self.failed_pages > 0
    }
}

// Merges page reports into a SiteReport
//
// Parameters:
//   config: supplies the table limits and the seed/sitemap URLs
//   pages: every page report the crawl produced (any order)
//   warnings: site warnings raised before aggregation (sitemap, caps, deadline)
//   partial: whether the crawl was cut short
pub fn aggregate(
    config: &CrawlConfig,
    mut pages: Vec<PageReport>,
    mut warnings: Vec<SiteWarning>,
    partial: bool,
) -> SiteReport {
    pages.sort_by_key(|p| p.discovery_index);

    let mut totals = NGramCounts::default();
    for page in &pages {
        totals.merge(&page.ngrams);
    }

    warnings.extend(duplicates(&pages));

    let limits = config.limits;
    SiteReport {
        seed_url: config.seed_url.to_string(),
        sitemap_url: config.sitemap_url.clone(),
        total_pages: pages.len(),
        failed_pages: pages.iter().filter(|p| !p.is_ok()).count(),
        total_words: pages.iter().map(|p| p.word_count).sum(),
        partial,
        keywords: totals.keywords.ranked(limits.keywords),
        bigrams: totals.bigrams.ranked(limits.bigrams),
        trigrams: totals.trigrams.ranked(limits.trigrams),
        warnings,
        pages,
    }
}

// Exact-match duplicate titles, descriptions and body text among the pages
// that were fetched successfully. Groups come out sorted by their key.
fn duplicates(pages: &[PageReport]) -> Vec<SiteWarning> {
    let mut titles: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut descriptions: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut bodies: BTreeMap<&str, Vec<String>> = BTreeMap::new();

    for page in pages.iter().filter(|p| p.is_ok()) {
        if let Some(title) = page.title.as_deref().filter(|t| !t.is_empty()) {
            titles.entry(title).or_default().push(page.url.clone());
        }
        if let Some(description) = page.description.as_deref().filter(|d| !d.is_empty()) {
            descriptions
                .entry(description)
                .or_default()
                .push(page.url.clone());
        }
        if !page.body_text.is_empty() {
            bodies
                .entry(page.body_text.as_str())
                .or_default()
                .push(page.url.clone());
        }
    }

    let mut warnings = Vec::new();
    for (title, urls) in titles.into_iter().filter(|(_, u)| u.len() > 1) {
        warnings.push(SiteWarning::DuplicateTitle {
            title: title.to_string(),
            urls,
        });
    }
    for (description, urls) in descriptions.into_iter().filter(|(_, u)| u.len() > 1) {
        warnings.push(SiteWarning::DuplicateDescription {
            description: description.to_string(),
            urls,
        });
    }
    for (_, urls) in bodies.into_iter().filter(|(_, u)| u.len() > 1) {
        warnings.push(SiteWarning::DuplicateContent { urls });
    }
    warnings
}
