// src/config.rs
// =============================================================================
// Caller input and the validated crawl configuration.
//
// AnalyzeOptions is what a caller fills in (every field has a default).
// CrawlConfig is built from it exactly once, validated, and never mutated:
// the scheduler and every page analysis only ever borrow it.
//
// Validation happens here, before any request is made. Anything wrong with
// the seed URL or the limits is a ConfigError; the sitemap URL is checked
// later by the sitemap resolver because a bad sitemap must not stop the crawl.
// =============================================================================

use std::time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::extract::{default_extra_tags, CompiledTag, TagSelector};
use crate::ngram::{NGramCounter, StopWords};

/// Options accepted by [`crate::analyze`].
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Report h1-h6 contents per page
    pub analyze_headings: bool,
    /// Report the `extra_tags` findings per page
    pub analyze_extra_tags: bool,
    /// Enqueue same-host links found on crawled pages
    pub follow_links: bool,
    pub keyword_limit: usize,
    pub bigram_limit: usize,
    pub trigram_limit: usize,
    /// Stop admitting new URLs once this many have been admitted
    pub max_pages: Option<usize>,
    /// Do not enqueue links deeper than this (seeds are depth 0)
    pub max_depth: Option<usize>,
    /// Number of fetches allowed in flight at once
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub max_redirects: usize,
    /// Whole-crawl deadline; when it passes, the report is returned partial
    pub deadline: Option<Duration>,
    pub user_agent: String,
    pub extra_tags: Vec<TagSelector>,
    /// `None` uses the built-in English list
    pub stop_words: Option<Vec<String>>,
    pub min_word_length: usize,
    /// Pages with fewer words than this get a thin-content warning
    pub thin_content_threshold: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            analyze_headings: false,
            analyze_extra_tags: false,
            follow_links: false,
            keyword_limit: 4,
            bigram_limit: 4,
            trigram_limit: 4,
            max_pages: None,
            max_depth: None,
            concurrency: 4,
            request_timeout: Duration::from_secs(10),
            max_redirects: 10,
            deadline: None,
            user_agent: format!("seo-analyzer/{}", env!("CARGO_PKG_VERSION")),
            extra_tags: default_extra_tags(),
            stop_words: None,
            min_word_length: 3,
            thin_content_threshold: 250,
        }
    }
}

/// Output sizes of the three ranked tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLimits {
    pub keywords: usize,
    pub bigrams: usize,
    pub trigrams: usize,
}

/// The validated, immutable configuration of one crawl.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed_url: Url,
    pub sitemap_url: Option<String>,
    pub follow_links: bool,
    pub analyze_headings: bool,
    pub analyze_extra_tags: bool,
    pub limits: TableLimits,
    pub max_pages: Option<usize>,
    pub max_depth: Option<usize>,
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub max_redirects: usize,
    pub deadline: Option<Duration>,
    pub user_agent: String,
    pub extra_tags: Vec<CompiledTag>,
    pub counter: NGramCounter,
    pub thin_content_threshold: usize,
}

impl CrawlConfig {
    // Validates caller input and builds the configuration
    //
    // Returns ConfigError for:
    //   - a seed that is not an absolute http(s) URL with a host
    //   - concurrency 0, a zero request timeout, max_pages 0, min_word_length 0
    //   - an extra-tag selector that does not compile
    pub fn from_options(
        seed_url: &str,
        sitemap_url: Option<&str>,
        options: AnalyzeOptions,
    ) -> Result<Self, ConfigError> {
        let seed_url = parse_seed(seed_url)?;

        if options.concurrency == 0 {
            return Err(invalid("concurrency", "must be at least 1"));
        }
        if options.request_timeout.is_zero() {
            return Err(invalid("request_timeout", "must be greater than zero"));
        }
        if options.max_pages == Some(0) {
            return Err(invalid("max_pages", "must be at least 1 when set"));
        }
        if options.min_word_length == 0 {
            return Err(invalid("min_word_length", "must be at least 1"));
        }

        let extra_tags = options
            .extra_tags
            .iter()
            .map(TagSelector::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let stop_words = match options.stop_words {
            Some(words) => StopWords::new(words),
            None => StopWords::english(),
        };

        Ok(Self {
            seed_url,
            sitemap_url: sitemap_url
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            follow_links: options.follow_links,
            analyze_headings: options.analyze_headings,
            analyze_extra_tags: options.analyze_extra_tags,
            limits: TableLimits {
                keywords: options.keyword_limit,
                bigrams: options.bigram_limit,
                trigrams: options.trigram_limit,
            },
            max_pages: options.max_pages,
            max_depth: options.max_depth,
            concurrency: options.concurrency,
            request_timeout: options.request_timeout,
            max_redirects: options.max_redirects,
            deadline: options.deadline,
            user_agent: options.user_agent,
            extra_tags,
            counter: NGramCounter::new(stop_words, options.min_word_length),
            thin_content_threshold: options.thin_content_threshold,
        })
    }
}

fn parse_seed(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidSeedUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            scheme: url.scheme().to_string(),
        });
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::MissingHost(raw.to_string()));
    }

    url.set_fragment(None);
    Ok(url)
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidLimit {
        name,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_command_line_defaults() {
        let options = AnalyzeOptions::default();
        assert!(!options.analyze_headings);
        assert!(!options.analyze_extra_tags);
        assert!(!options.follow_links);
        assert_eq!(options.keyword_limit, 4);
        assert_eq!(options.bigram_limit, 4);
        assert_eq!(options.trigram_limit, 4);
    }

    #[test]
    fn test_valid_seed() {
        let config =
            CrawlConfig::from_options("https://Example.com/a#top", Some(" "), AnalyzeOptions::default())
                .unwrap();
        assert_eq!(config.seed_url.as_str(), "https://example.com/a");
        assert_eq!(config.sitemap_url, None);
    }

    #[test]
    fn test_malformed_seed_is_config_error() {
        let err = CrawlConfig::from_options("not a url", None, AnalyzeOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSeedUrl { .. }));

        let err = CrawlConfig::from_options("ftp://example.com", None, AnalyzeOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let options = AnalyzeOptions { concurrency: 0, ..AnalyzeOptions::default() };
        let err = CrawlConfig::from_options("https://example.com", None, options).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLimit { name: "concurrency", .. }));

        let options = AnalyzeOptions { max_pages: Some(0), ..AnalyzeOptions::default() };
        assert!(CrawlConfig::from_options("https://example.com", None, options).is_err());

        let options = AnalyzeOptions {
            request_timeout: Duration::ZERO,
            ..AnalyzeOptions::default()
        };
        assert!(CrawlConfig::from_options("https://example.com", None, options).is_err());
    }

    #[test]
    fn test_zero_table_limits_are_valid() {
        let options = AnalyzeOptions {
            keyword_limit: 0,
            bigram_limit: 0,
            trigram_limit: 0,
            ..AnalyzeOptions::default()
        };
        let config = CrawlConfig::from_options("https://example.com", None, options).unwrap();
        assert_eq!(config.limits.keywords, 0);
    }

    #[test]
    fn test_custom_stop_words() {
        let options = AnalyzeOptions {
            stop_words: Some(vec!["seo".to_string()]),
            ..AnalyzeOptions::default()
        };
        let config = CrawlConfig::from_options("https://example.com", None, options).unwrap();
        let counts = config.counter.count("seo tools");
        assert_eq!(counts.keywords.get("seo"), 0);
        assert_eq!(counts.keywords.get("tools"), 1);
    }
}
