// src/crawl/scheduler.rs
// =============================================================================
// This module drives the crawl breadth-first over the frontier.
//
// How it works:
// 1. The seed URL and any sitemap URLs go into the frontier at depth 0
// 2. Up to `concurrency` page analyses run at once
// 3. As each one finishes, its report is kept and (with follow_links) its
//    same-site links are offered to the frontier at depth + 1. A site is a
//    (host, port) pair: the seed's, plus wherever the seed redirected to
// 4. Repeat until the frontier is empty and nothing is in flight
//
// Concurrency:
// - All in-flight analyses are futures polled by this one task through
//   FuturesUnordered. Only this loop touches the frontier, so dequeue,
//   enqueue and visited-set updates can never interleave, and no URL can be
//   dispatched twice.
// - Network I/O is the only place an analysis yields.
//
// Cancellation:
// - The deadline is an instant fixed by the caller, so time spent resolving
//   the sitemap counts against it too.
// - With a deadline, no new fetch is dispatched once it has passed. Fetches
//   already in flight are awaited (each is bounded by the request timeout)
//   and the result is marked partial.
// =============================================================================

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use super::frontier::{normalize_url, Admission, Frontier, UrlRecord};
use crate::analyzer::{Fetcher, PageAnalyzer, PageOutcome, PageReport};
use crate::config::CrawlConfig;
use crate::report::SiteWarning;

/// What a crawl produced, before aggregation.
#[derive(Debug, Clone)]
pub struct CrawlOutput {
    /// One report per URL attempted, in completion order
    pub pages: Vec<PageReport>,
    pub warnings: Vec<SiteWarning>,
    /// True when the deadline stopped the crawl early
    pub partial: bool,
}

// Crawls from the given seeds
//
// Parameters:
//   config: the validated crawl configuration
//   fetcher: HTTP capability shared by all page analyses
//   seeds: the seed URL first, then sitemap entries, all depth 0
//   deadline: no dispatch happens at or after this instant
pub async fn crawl(
    config: &CrawlConfig,
    fetcher: &Fetcher,
    seeds: Vec<UrlRecord>,
    deadline: Option<Instant>,
) -> CrawlOutput {
    let analyzer = PageAnalyzer::new(config, fetcher);
    let mut sites: HashSet<Site> = site_of(&config.seed_url).into_iter().collect();

    let mut frontier = Frontier::new(config.max_pages, config.max_depth);
    for seed in seeds {
        frontier.push(seed);
    }

    info!(
        seed = %config.seed_url,
        queued = frontier.pending_len(),
        follow_links = config.follow_links,
        "starting crawl"
    );

    let mut deadline_hit = false;
    let mut in_flight = FuturesUnordered::new();
    let mut pages = Vec::new();

    loop {
        if !deadline_hit && deadline.is_some_and(|d| Instant::now() >= d) {
            deadline_hit = true;
        }

        // Fill the pool
        while !deadline_hit && in_flight.len() < config.concurrency {
            let Some(record) = frontier.pop() else {
                break;
            };
            debug!(depth = record.depth, url = %record.url, "dispatching");
            in_flight.push(analyzer.analyze(record));
        }

        if in_flight.is_empty() {
            break;
        }

        let next = match deadline {
            Some(deadline) if !deadline_hit => {
                tokio::select! {
                    outcome = in_flight.next() => outcome,
                    _ = tokio::time::sleep_until(deadline) => {
                        deadline_hit = true;
                        continue;
                    }
                }
            }
            _ => in_flight.next().await,
        };

        let Some(outcome) = next else {
            continue;
        };

        let PageOutcome { report, discovered } = outcome;

        // The redirect target has now been fetched as well
        if let Some(final_url) = report.final_url.as_deref().and_then(|u| Url::parse(u).ok()) {
            frontier.mark_visited(&normalize_url(&final_url));

            // example.com -> www.example.com: the site moved with the seed
            if report.discovery_index == 0 && report.is_ok() {
                if let Some(site) = site_of(&final_url) {
                    if sites.insert(site) {
                        debug!(to = %final_url, "seed redirected, following its site too");
                    }
                }
            }
        }

        if config.follow_links && report.is_ok() {
            let depth = report.depth + 1;
            for link in discovered {
                // Off-site links stay in the page's link list but are not crawled
                if !site_of(&link).is_some_and(|site| sites.contains(&site)) {
                    continue;
                }
                let record = UrlRecord::new(link, depth, Some(report.url.clone()));
                if frontier.push(record) == Admission::Queued {
                    debug!(depth, from = %report.url, "link queued");
                }
            }
        }

        pages.push(report);
    }

    let mut warnings = Vec::new();

    if deadline_hit {
        let unvisited = frontier.pending_len();
        warn!(unvisited, "crawl deadline reached");
        warnings.push(SiteWarning::DeadlineReached { unvisited });
    }

    if let Some(max_pages) = config.max_pages {
        let refused = frontier.refused_by_page_limit();
        if refused > 0 {
            warn!(max_pages, refused, "page limit reached");
            warnings.push(SiteWarning::PageLimitReached { max_pages, refused });
        }
    }

    if let Some(max_depth) = config.max_depth {
        let refused = frontier.refused_by_depth_limit();
        if refused > 0 {
            warnings.push(SiteWarning::DepthLimitReached { max_depth, refused });
        }
    }

    info!(
        pages = pages.len(),
        visited = frontier.visited_len(),
        partial = deadline_hit,
        "crawl finished"
    );

    CrawlOutput {
        pages,
        warnings,
        partial: deadline_hit,
    }
}

// Lower-cased host and effective port
type Site = (String, u16);

fn site_of(url: &Url) -> Option<Site> {
    Some((url.host_str()?.to_ascii_lowercase(), url.port_or_known_default()?))
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why FuturesUnordered instead of tokio::spawn per page?
//    - Spawned tasks would need the frontier behind a lock
//    - Keeping every future inside this task makes the frontier plain owned
//      data; the futures only borrow the analyzer
//
// 2. Why is the deadline raced with tokio::select!?
//    - Without it, a long fetch would hide the deadline until it completes
//      and the pool would keep refilling in the meantime
//
// 3. Breadth-first vs depth-first:
//    - Frontier is FIFO, so all depth-1 pages are dispatched before any
//      depth-2 page, which keeps max_depth predictable
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzeOptions;
    use crate::error::FetchError;
    use mockito::{Matcher, Server, ServerGuard};
    use std::time::Duration;

    fn html(body: &str) -> String {
        format!("<html><head><title>Test page title</title></head><body>{}</body></html>", body)
    }

    async fn page(server: &mut ServerGuard, path: &str, body: &str) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(html(body))
            .expect(1)
            .create_async()
            .await
    }

    async fn run(seed: &str, options: AnalyzeOptions, extra_seeds: &[&str]) -> CrawlOutput {
        let config = CrawlConfig::from_options(seed, None, options).unwrap();
        let fetcher = Fetcher::new(&config).unwrap();
        let mut seeds = vec![UrlRecord::seed(config.seed_url.clone())];
        for extra in extra_seeds {
            seeds.push(UrlRecord::seed(Url::parse(extra).unwrap()));
        }
        let deadline = config.deadline.map(|d| Instant::now() + d);
        crawl(&config, &fetcher, seeds, deadline).await
    }

    fn follow() -> AnalyzeOptions {
        AnalyzeOptions {
            follow_links: true,
            ..AnalyzeOptions::default()
        }
    }

    #[tokio::test]
    async fn test_follow_links_visits_each_page_once() {
        let mut server = Server::new_async().await;
        let base = server.url();

        // A cycle (/ -> /a -> / ), a duplicate via trailing slash and fragment,
        // and a self link
        let root = page(&mut server, "/", r##"<a href="/a">A</a><a href="/b">B</a><a href="/a/#top">A again</a>"##).await;
        let a = page(&mut server, "/a", r#"<a href="/">Home</a><a href="/a">Self</a><a href="/b">B</a>"#).await;
        let b = page(&mut server, "/b", "<p>leaf</p>").await;

        let output = run(&base, follow(), &[]).await;

        assert_eq!(output.pages.len(), 3);
        assert!(!output.partial);
        let mut urls: Vec<&str> = output.pages.iter().map(|p| p.url.as_str()).collect();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), 3);

        root.assert_async().await;
        a.assert_async().await;
        b.assert_async().await;
    }

    #[tokio::test]
    async fn test_without_follow_links_only_seeds_are_crawled() {
        let mut server = Server::new_async().await;
        let base = server.url();

        let _m = page(&mut server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
        let _m = page(&mut server, "/extra", r#"<a href="/c">C</a>"#).await;
        let never = server
            .mock("GET", Matcher::Regex("^/(a|b|c)$".to_string()))
            .expect(0)
            .create_async()
            .await;

        let extra = format!("{}/extra", base);
        let output = run(&base, AnalyzeOptions::default(), &[&extra]).await;

        assert_eq!(output.pages.len(), 2);
        // links are still reported
        let links: usize = output.pages.iter().map(|p| p.links.len()).sum();
        assert_eq!(links, 3);
        never.assert_async().await;
    }

    #[tokio::test]
    async fn test_off_site_links_are_not_followed() {
        let mut server = Server::new_async().await;
        let base = server.url();

        let _m = page(&mut server, "/", r#"<a href="http://off-site.invalid/page">Elsewhere</a>"#).await;

        let output = run(&base, follow(), &[]).await;
        assert_eq!(output.pages.len(), 1);
        assert_eq!(output.pages[0].links[0].url, "http://off-site.invalid/page");
    }

    #[test]
    fn test_site_of_uses_effective_port() {
        let site = |s: &str| site_of(&Url::parse(s).unwrap());
        assert_eq!(site("https://Example.com/a"), Some(("example.com".to_string(), 443)));
        assert_eq!(site("https://example.com:443/"), site("https://example.com/"));
        assert_ne!(site("http://example.com:8080/"), site("http://example.com/"));
    }

    #[tokio::test]
    async fn test_same_host_other_port_is_not_followed() {
        let mut server = Server::new_async().await;
        let base = server.url();

        // Nothing listens on port 9 (discard); it must never be fetched anyway
        let _m = page(&mut server, "/", r#"<a href="http://127.0.0.1:9/other">Other port</a>"#).await;

        let output = run(&base, follow(), &[]).await;
        assert_eq!(output.pages.len(), 1);
        assert_eq!(output.pages[0].links[0].url, "http://127.0.0.1:9/other");
    }

    #[tokio::test]
    async fn test_seed_redirect_to_other_host_is_followed() {
        let mut server = Server::new_async().await;
        let port = Url::parse(&server.url()).unwrap().port().unwrap();

        let _m = server
            .mock("GET", "/")
            .with_status(301)
            .with_header("location", &format!("http://127.0.0.1:{}/home", port))
            .create_async()
            .await;
        let home = page(&mut server, "/home", r#"<a href="/about">About</a>"#).await;
        let about = page(&mut server, "/about", "<p>about us</p>").await;

        let seed = format!("http://localhost:{}/", port);
        let output = run(&seed, follow(), &[]).await;

        assert_eq!(output.pages.len(), 2);
        assert_eq!(
            output.pages[0].final_url.as_deref(),
            Some(format!("http://127.0.0.1:{}/home", port).as_str())
        );
        assert_eq!(output.pages[1].url, format!("http://127.0.0.1:{}/about", port));
        home.assert_async().await;
        about.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_page_is_recorded_and_crawl_continues() {
        let mut server = Server::new_async().await;
        let base = server.url();

        let _m = page(&mut server, "/", r#"<a href="/missing">Missing</a><a href="/ok">Ok</a>"#).await;
        let _m = server.mock("GET", "/missing").with_status(404).expect(1).create_async().await;
        let _m = page(&mut server, "/ok", "<p>fine</p>").await;

        let output = run(&base, follow(), &[]).await;
        assert_eq!(output.pages.len(), 3);

        let missing = output
            .pages
            .iter()
            .find(|p| p.url.ends_with("/missing"))
            .unwrap();
        assert!(missing.error.is_some());
        assert_eq!(missing.status, Some(404));
        assert!(missing.ngrams.is_empty());
    }

    #[tokio::test]
    async fn test_page_cap_bounds_the_crawl() {
        let mut server = Server::new_async().await;
        let base = server.url();

        let links: String = (0..10).map(|i| format!(r#"<a href="/p{}">p</a>"#, i)).collect();
        let _m = page(&mut server, "/", &links).await;
        let _m = server
            .mock("GET", Matcher::Regex("^/p[0-9]$".to_string()))
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(html("<p>child</p>"))
            .expect(2)
            .create_async()
            .await;

        let options = AnalyzeOptions {
            max_pages: Some(3),
            ..follow()
        };
        let output = run(&base, options, &[]).await;

        assert_eq!(output.pages.len(), 3);
        assert!(output
            .warnings
            .contains(&SiteWarning::PageLimitReached { max_pages: 3, refused: 8 }));
    }

    #[tokio::test]
    async fn test_depth_cap() {
        let mut server = Server::new_async().await;
        let base = server.url();

        let _m = page(&mut server, "/", r#"<a href="/one">1</a>"#).await;
        let _m = page(&mut server, "/one", r#"<a href="/two">2</a>"#).await;
        let two = server.mock("GET", "/two").expect(0).create_async().await;

        let options = AnalyzeOptions {
            max_depth: Some(1),
            ..follow()
        };
        let output = run(&base, options, &[]).await;

        assert_eq!(output.pages.len(), 2);
        assert_eq!(output.pages.iter().map(|p| p.depth).max(), Some(1));
        two.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_deadline_returns_partial_output() {
        let options = AnalyzeOptions {
            deadline: Some(Duration::ZERO),
            ..AnalyzeOptions::default()
        };
        let output = run("http://127.0.0.1:9/", options, &[]).await;

        assert!(output.partial);
        assert!(output.pages.is_empty());
        assert!(output
            .warnings
            .contains(&SiteWarning::DeadlineReached { unvisited: 1 }));
    }

    #[tokio::test]
    async fn test_deadline_during_fetch_drains_in_flight_page() {
        // Accepts connections (kernel backlog) but never answers
        let silent = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let seed = format!("http://{}/", silent.local_addr().unwrap());

        let options = AnalyzeOptions {
            deadline: Some(Duration::from_millis(200)),
            request_timeout: Duration::from_secs(1),
            ..AnalyzeOptions::default()
        };
        let output = run(&seed, options, &[]).await;

        assert!(output.partial);
        assert_eq!(output.pages.len(), 1);
        assert_eq!(output.pages[0].error, Some(FetchError::Timeout));
        assert!(output
            .warnings
            .contains(&SiteWarning::DeadlineReached { unvisited: 0 }));
        drop(silent);
    }

    #[tokio::test]
    async fn test_single_worker_completes_in_discovery_order() {
        let mut server = Server::new_async().await;
        let base = server.url();

        let _m = page(&mut server, "/", r#"<a href="/x">x</a><a href="/y">y</a>"#).await;
        let _m = page(&mut server, "/x", "").await;
        let _m = page(&mut server, "/y", "").await;

        let options = AnalyzeOptions {
            concurrency: 1,
            ..follow()
        };
        let output = run(&base, options, &[]).await;
        let indices: Vec<usize> = output.pages.iter().map(|p| p.discovery_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
