// src/lib.rs
// =============================================================================
// seo-analyzer: crawl a website and report its on-page SEO signals.
//
// The pipeline:
//   sitemap (optional) -> seeds -> crawl frontier -> page analysis
//     (fetch, extract, count n-grams) -> page reports -> site report
//
// Entry point: `analyze(seed_url, sitemap_url, options)`. The only error it
// can return is a ConfigError, raised before any request is made; page and
// sitemap failures end up inside the SiteReport.
// =============================================================================

pub mod analyzer;
pub mod config;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod ngram;
pub mod report;
pub mod sitemap;

pub use analyzer::{PageReport, PageWarning};
pub use config::{AnalyzeOptions, CrawlConfig};
pub use error::{ConfigError, FetchError, SitemapError};
pub use extract::TagSelector;
pub use report::{SiteReport, SiteWarning};

use tokio::time::Instant;
use tracing::{info, warn};

use analyzer::Fetcher;
use crawl::UrlRecord;

/// Analyzes the site at `seed_url`, optionally seeded further by a sitemap.
///
/// Example:
/// ```no_run
/// # async fn run() -> Result<(), seo_analyzer::ConfigError> {
/// let report = seo_analyzer::analyze(
///     "https://example.com/",
///     None,
///     seo_analyzer::AnalyzeOptions::default(),
/// )
/// .await?;
/// println!("{} pages", report.total_pages);
/// # Ok(())
/// # }
/// ```
pub async fn analyze(
    seed_url: &str,
    sitemap_url: Option<&str>,
    options: AnalyzeOptions,
) -> Result<SiteReport, ConfigError> {
    let config = CrawlConfig::from_options(seed_url, sitemap_url, options)?;
    analyze_with_config(&config).await
}

/// Runs the analysis for an already validated configuration.
///
/// The deadline, when set, starts here and covers sitemap resolution as well
/// as the crawl.
pub async fn analyze_with_config(config: &CrawlConfig) -> Result<SiteReport, ConfigError> {
    let deadline = config.deadline.map(|d| Instant::now() + d);
    let fetcher = Fetcher::new(config)?;

    let mut seeds = vec![UrlRecord::seed(config.seed_url.clone())];
    let mut warnings = Vec::new();
    let mut sitemap_cut_short = false;

    if let Some(sitemap_url) = &config.sitemap_url {
        let resolving = sitemap::resolve(&fetcher, sitemap_url);
        let outcome = match deadline {
            Some(at) => tokio::time::timeout_at(at, resolving).await.ok(),
            None => Some(resolving.await),
        };

        match outcome {
            Some(outcome) => {
                info!(sitemap = %sitemap_url, seeds = outcome.seeds.len(), "sitemap resolved");
                seeds.extend(outcome.seeds);
                warnings.extend(outcome.warnings);
            }
            None => {
                warn!(sitemap = %sitemap_url, "deadline reached while resolving sitemap");
                sitemap_cut_short = true;
                warnings.push(SiteWarning::SitemapError {
                    url: sitemap_url.clone(),
                    message: "deadline reached before the sitemap was resolved".to_string(),
                });
            }
        }
    }

    let output = crawl::crawl(config, &fetcher, seeds, deadline).await;
    warnings.extend(output.warnings);

    let partial = output.partial || sitemap_cut_short;
    Ok(report::aggregate(config, output.pages, warnings, partial))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Server, ServerGuard};
    use std::time::Duration;

    async fn html_page(server: &mut ServerGuard, path: &str, html: &str) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(html)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_seo_tools_scenario() {
        let mut server = Server::new_async().await;
        let _m = html_page(&mut server, "/", "<html><body><p>SEO tools. SEO tools help SEO.</p></body></html>").await;

        let options = AnalyzeOptions {
            keyword_limit: 2,
            stop_words: Some(Vec::new()),
            ..AnalyzeOptions::default()
        };
        let report = analyze(&server.url(), None, options).await.unwrap();

        let keywords: Vec<(&str, u64)> = report
            .keywords
            .iter()
            .map(|k| (k.term.as_str(), k.count))
            .collect();
        assert_eq!(keywords, vec![("seo", 3), ("tools", 2)]);
    }

    #[tokio::test]
    async fn test_sitemap_500_still_crawls_seed() {
        let mut server = Server::new_async().await;
        let _m = html_page(&mut server, "/", "<p>home page</p>").await;
        let _m = server.mock("GET", "/sitemap.xml").with_status(500).create_async().await;

        let sitemap = format!("{}/sitemap.xml", server.url());
        let report = analyze(&server.url(), Some(&sitemap), AnalyzeOptions::default())
            .await
            .unwrap();

        assert_eq!(report.total_pages, 1);
        assert!(report.pages[0].is_ok());
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, SiteWarning::SitemapError { .. })));
    }

    #[tokio::test]
    async fn test_sitemap_pages_are_seeds() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let _m = html_page(&mut server, "/", r#"<a href="/not-followed">x</a>"#).await;
        let _m = html_page(&mut server, "/from-sitemap", "<p>listed</p>").await;
        let _m = server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_body(format!(
                "<urlset><url><loc>{base}/from-sitemap</loc></url><url><loc>{base}/</loc></url></urlset>"
            ))
            .create_async()
            .await;

        let sitemap = format!("{}/sitemap.xml", base);
        let report = analyze(&base, Some(&sitemap), AnalyzeOptions::default())
            .await
            .unwrap();

        // seed + one new sitemap entry; the sitemap's copy of "/" collapses
        assert_eq!(report.total_pages, 2);
        assert_eq!(report.pages[1].referrer.as_deref(), Some(sitemap.as_str()));
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_404_page_is_reported() {
        let mut server = Server::new_async().await;
        let _m = server.mock("GET", "/").with_status(404).create_async().await;

        let report = analyze(&server.url(), None, AnalyzeOptions::default())
            .await
            .unwrap();

        assert_eq!(report.total_pages, 1);
        assert_eq!(report.failed_pages, 1);
        let page = &report.pages[0];
        assert_eq!(page.error, Some(FetchError::Status { status: 404 }));
        assert!(page.ngrams.keywords.is_empty());
        assert!(page.ngrams.bigrams.is_empty());
        assert!(page.ngrams.trigrams.is_empty());
        assert!(report.keywords.is_empty());
    }

    #[tokio::test]
    async fn test_rerun_is_identical() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let _m = html_page(
            &mut server,
            "/",
            r#"<title>Home page title</title><p>rust crawler engine rust</p><a href="/a">A</a><a href="/b">B</a>"#,
        )
        .await;
        let _m = html_page(&mut server, "/a", "<p>crawler parser tokenizer</p>").await;
        let _m = html_page(&mut server, "/b", "<p>parser engine</p>").await;

        let options = || AnalyzeOptions {
            follow_links: true,
            analyze_headings: true,
            analyze_extra_tags: true,
            ..AnalyzeOptions::default()
        };

        let first = analyze(&base, None, options()).await.unwrap();
        let second = analyze(&base, None, options()).await.unwrap();

        assert_eq!(first.total_pages, 3);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_deadline_bounds_sitemap_resolution() {
        let mut server = Server::new_async().await;
        let _m = html_page(&mut server, "/", "<p>home page</p>").await;

        // Accepts connections (kernel backlog) but never answers
        let silent = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let sitemap = format!("http://{}/sitemap.xml", silent.local_addr().unwrap());

        let options = AnalyzeOptions {
            deadline: Some(Duration::from_millis(300)),
            request_timeout: Duration::from_secs(5),
            ..AnalyzeOptions::default()
        };
        let started = std::time::Instant::now();
        let report = analyze(&server.url(), Some(&sitemap), options).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
        assert!(report.partial);
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            SiteWarning::SitemapError { url, .. } if *url == sitemap
        )));
        drop(silent);
    }

    #[tokio::test]
    async fn test_config_error_before_any_request() {
        let err = analyze("example.com", None, AnalyzeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSeedUrl { .. }));
    }
}
