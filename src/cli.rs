// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the struct below IS the CLI definition, and
// clap generates parsing, --help and --version from it.
//
// The flags mirror AnalyzeOptions one-to-one, plus the output choices
// (format, file) and logging verbosity which only matter to the binary.
// =============================================================================

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use seo_analyzer::{AnalyzeOptions, TagSelector};

#[derive(Parser, Debug)]
#[command(
    name = "seo-analyzer",
    version,
    about = "Analyze the on-page SEO of a website",
    long_about = "seo-analyzer crawls a site from a seed URL (and optionally a sitemap), \
                  extracts each page's text and markup, and reports keyword, bigram and \
                  trigram frequencies, heading and tag usage, and on-page warnings."
)]
pub struct Cli {
    /// URL of the site you are wanting to analyze
    pub site: String,

    /// URL of the sitemap to seed the crawler with
    #[arg(short, long)]
    pub sitemap: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
    pub output_format: OutputFormat,

    /// File to save results to instead of sending to stdout
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Number of keywords to include in the output
    #[arg(short, long, default_value_t = 4)]
    pub keyword_limit: usize,

    /// Number of bigrams to include in the output
    #[arg(short, long, default_value_t = 4)]
    pub bigram_limit: usize,

    /// Number of trigrams to include in the output
    #[arg(short, long, default_value_t = 4)]
    pub trigram_limit: usize,

    /// Analyze heading tags (h1-h6)
    #[arg(long)]
    pub analyze_headings: bool,

    /// Analyze extra tags (see --extra-tag)
    #[arg(long)]
    pub analyze_extra_tags: bool,

    /// Extra tag to collect, as "tag" (text) or "tag[attr]" (attribute value).
    /// Repeatable; replaces the default set img[alt], a[rel], strong, b, em
    #[arg(long = "extra-tag", value_name = "SELECTOR")]
    pub extra_tags: Vec<TagSelector>,

    /// Analyze all the inner links found on crawled pages as well
    #[arg(long)]
    pub follow_links: bool,

    /// Stop queueing new pages after this many
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Do not follow links deeper than this (the seed is depth 0)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Number of pages fetched concurrently
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Stop dispatching new requests after this many seconds and report what was crawled
    #[arg(long)]
    pub deadline: Option<u64>,

    /// Enable debug logging (on stderr)
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

impl Cli {
    pub fn analyze_options(&self) -> AnalyzeOptions {
        let defaults = AnalyzeOptions::default();
        AnalyzeOptions {
            analyze_headings: self.analyze_headings,
            analyze_extra_tags: self.analyze_extra_tags,
            follow_links: self.follow_links,
            keyword_limit: self.keyword_limit,
            bigram_limit: self.bigram_limit,
            trigram_limit: self.trigram_limit,
            max_pages: self.max_pages,
            max_depth: self.max_depth,
            concurrency: self.concurrency,
            request_timeout: Duration::from_secs(self.timeout),
            deadline: self.deadline.map(Duration::from_secs),
            extra_tags: if self.extra_tags.is_empty() {
                defaults.extra_tags.clone()
            } else {
                self.extra_tags.clone()
            },
            ..defaults
        }
    }
}
