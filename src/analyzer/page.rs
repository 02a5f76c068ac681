// src/analyzer/page.rs
// =============================================================================
// Analysis of a single page.
//
// analyze() = fetch + extract + count + warnings. The result is an immutable
// PageReport plus the links found on the page; nothing is written anywhere
// else, so any number of analyses can run side by side.
//
// A failed fetch still produces a PageReport, with `error` set and empty
// n-gram tables. Heading and extra-tag findings exist only when the
// corresponding option is on, and are not computed otherwise.
// =============================================================================

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};
use url::Url;

use super::fetch::{FetchedPage, Fetcher};
use crate::config::CrawlConfig;
use crate::crawl::UrlRecord;
use crate::error::FetchError;
use crate::extract::{extract, ExtractOptions, ExtractedPage, Link};
use crate::ngram::{tokenize, NGramCounts};

const TITLE_MIN: usize = 10;
const TITLE_MAX: usize = 70;
const DESCRIPTION_MIN: usize = 140;
const DESCRIPTION_MAX: usize = 255;

// Anchor texts that say nothing about the target page
const GENERIC_ANCHOR_TEXT: &[&str] = &[
    "click here",
    "here",
    "read more",
    "more",
    "learn more",
    "link",
    "this link",
    "page",
    "article",
];

/// An on-page problem. Serialized with a `kind` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageWarning {
    MissingTitle,
    TitleTooShort { length: usize },
    TitleTooLong { length: usize },
    MissingDescription,
    DescriptionTooShort { length: usize },
    DescriptionTooLong { length: usize },
    /// No extractable text at all
    EmptyContent,
    ThinContent { word_count: usize, threshold: usize },
    ImageMissingAlt { src: String },
    GenericAnchorText { url: String, text: String },
    MissingH1,
    MultipleH1 { count: usize },
}

impl fmt::Display for PageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "Missing title tag"),
            Self::TitleTooShort { length } => {
                write!(f, "Title tag is too short ({} < {} characters)", length, TITLE_MIN)
            }
            Self::TitleTooLong { length } => {
                write!(f, "Title tag is too long ({} > {} characters)", length, TITLE_MAX)
            }
            Self::MissingDescription => write!(f, "Missing meta description"),
            Self::DescriptionTooShort { length } => write!(
                f,
                "Meta description is too short ({} < {} characters)",
                length, DESCRIPTION_MIN
            ),
            Self::DescriptionTooLong { length } => write!(
                f,
                "Meta description is too long ({} > {} characters)",
                length, DESCRIPTION_MAX
            ),
            Self::EmptyContent => write!(f, "Page has no extractable text"),
            Self::ThinContent { word_count, threshold } => {
                write!(f, "Thin content ({} words, expected at least {})", word_count, threshold)
            }
            Self::ImageMissingAlt { src } => write!(f, "Image missing alt text: {}", src),
            Self::GenericAnchorText { url, text } => {
                write!(f, "Generic anchor text '{}' for {}", text, url)
            }
            Self::MissingH1 => write!(f, "Page has no h1 heading"),
            Self::MultipleH1 { count } => write!(f, "Page has {} h1 headings", count),
        }
    }
}

/// Everything learned about one URL. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    pub discovery_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FetchError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub word_count: usize,
    pub warnings: Vec<PageWarning>,
    /// "h1".."h6" -> heading texts in document order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headings: Option<BTreeMap<String, Vec<String>>>,
    /// selector label ("img[alt]") -> values in document order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_tags: Option<BTreeMap<String, Vec<String>>>,
    pub links: Vec<Link>,
    pub ngrams: NGramCounts,
    /// Extracted body text, kept for duplicate-content detection only
    #[serde(skip)]
    pub body_text: String,
}

impl PageReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    // A report for a URL that could not be analyzed
    fn failed(record: &UrlRecord, error: FetchError) -> Self {
        let status = match &error {
            FetchError::Status { status } => Some(*status),
            _ => None,
        };

        Self {
            url: record.url.to_string(),
            final_url: None,
            depth: record.depth,
            referrer: record.referrer.clone(),
            discovery_index: record.index,
            status,
            error: Some(error),
            content_type: None,
            title: None,
            description: None,
            word_count: 0,
            warnings: Vec::new(),
            headings: None,
            extra_tags: None,
            links: Vec::new(),
            ngrams: NGramCounts::default(),
            body_text: String::new(),
        }
    }
}

/// A page report plus the absolute links discovered on the page.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub report: PageReport,
    pub discovered: Vec<Url>,
}

/// Runs fetch, extraction and counting for one URL at a time.
#[derive(Debug, Clone, Copy)]
pub struct PageAnalyzer<'a> {
    config: &'a CrawlConfig,
    fetcher: &'a Fetcher,
}

impl<'a> PageAnalyzer<'a> {
    pub fn new(config: &'a CrawlConfig, fetcher: &'a Fetcher) -> Self {
        Self { config, fetcher }
    }

    pub async fn analyze(&self, record: UrlRecord) -> PageOutcome {
        match self.fetcher.fetch_html(&record.url).await {
            Ok(fetched) => self.analyze_fetched(&record, fetched),
            Err(error) => {
                warn!(url = %record.url, %error, "page fetch failed");
                PageOutcome {
                    report: PageReport::failed(&record, error),
                    discovered: Vec::new(),
                }
            }
        }
    }

    /// Builds the report for a page that has already been fetched.
    pub fn analyze_fetched(&self, record: &UrlRecord, fetched: FetchedPage) -> PageOutcome {
        let config = self.config;

        let extra_tags = if config.analyze_extra_tags {
            Some(config.extra_tags.as_slice())
        } else {
            None
        };
        let options = ExtractOptions {
            headings: config.analyze_headings,
            extra_tags,
        };
        let extracted = extract(&fetched.body, &fetched.final_url, &options);

        let tokens = tokenize(&extracted.body_text);
        let word_count = tokens.len();
        let ngrams = config.counter.count_tokens(&tokens);
        let warnings = page_warnings(&extracted, word_count, config);

        debug!(url = %record.url, word_count, warnings = warnings.len(), "page analyzed");

        let discovered = extracted
            .links
            .iter()
            .filter_map(|link| Url::parse(&link.url).ok())
            .collect();

        let headings = config.analyze_headings.then(|| {
            let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for heading in &extracted.headings {
                map.entry(format!("h{}", heading.level))
                    .or_default()
                    .push(heading.text.clone());
            }
            map
        });

        let extra_tags = config.analyze_extra_tags.then(|| {
            let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for finding in &extracted.extra_tags {
                map.entry(finding.tag.clone())
                    .or_default()
                    .push(finding.value.clone());
            }
            map
        });

        let final_url = (fetched.final_url.as_str() != record.url.as_str())
            .then(|| fetched.final_url.to_string());

        let ExtractedPage {
            title,
            description,
            body_text,
            links,
            ..
        } = extracted;

        let report = PageReport {
            url: record.url.to_string(),
            final_url,
            depth: record.depth,
            referrer: record.referrer.clone(),
            discovery_index: record.index,
            status: Some(fetched.status),
            error: None,
            content_type: fetched.content_type,
            title,
            description,
            word_count,
            warnings,
            headings,
            extra_tags,
            links,
            ngrams,
            body_text,
        };

        PageOutcome { report, discovered }
    }
}

fn page_warnings(page: &ExtractedPage, word_count: usize, config: &CrawlConfig) -> Vec<PageWarning> {
    let mut warnings = Vec::new();

    match page.title.as_deref().map(|t| t.chars().count()) {
        None | Some(0) => warnings.push(PageWarning::MissingTitle),
        Some(length) if length < TITLE_MIN => warnings.push(PageWarning::TitleTooShort { length }),
        Some(length) if length > TITLE_MAX => warnings.push(PageWarning::TitleTooLong { length }),
        Some(_) => {}
    }

    match page.description.as_deref().map(|d| d.chars().count()) {
        None | Some(0) => warnings.push(PageWarning::MissingDescription),
        Some(length) if length < DESCRIPTION_MIN => {
            warnings.push(PageWarning::DescriptionTooShort { length })
        }
        Some(length) if length > DESCRIPTION_MAX => {
            warnings.push(PageWarning::DescriptionTooLong { length })
        }
        Some(_) => {}
    }

    if page.body_text.is_empty() {
        warnings.push(PageWarning::EmptyContent);
    } else if word_count < config.thin_content_threshold {
        warnings.push(PageWarning::ThinContent {
            word_count,
            threshold: config.thin_content_threshold,
        });
    }

    if config.analyze_headings {
        match page.headings.iter().filter(|h| h.level == 1).count() {
            0 => warnings.push(PageWarning::MissingH1),
            1 => {}
            count => warnings.push(PageWarning::MultipleH1 { count }),
        }
    }

    for src in &page.images_missing_alt {
        warnings.push(PageWarning::ImageMissingAlt { src: src.clone() });
    }

    for link in &page.links {
        let text = link.text.to_lowercase();
        if GENERIC_ANCHOR_TEXT.contains(&text.as_str()) {
            warnings.push(PageWarning::GenericAnchorText {
                url: link.url.clone(),
                text: link.text.clone(),
            });
        }
    }

    warnings
}
