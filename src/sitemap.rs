// src/sitemap.rs
// =============================================================================
// Turns a sitemap into extra seed URLs.
//
// Supported formats:
// - XML <urlset> with <url><loc> entries
// - XML <sitemapindex>: each child sitemap is fetched (one level deep, no
//   nested indexes) and its entries are used
// - plain text, one URL per line
//
// Everything fails soft: a sitemap that cannot be fetched or parsed yields
// no seeds and a SiteWarning, and the crawl carries on from the seed URL.
// =============================================================================

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};
use url::Url;

use crate::analyzer::Fetcher;
use crate::crawl::UrlRecord;
use crate::error::SitemapError;
use crate::report::SiteWarning;

// Upper bound on child sitemaps fetched from one index
const MAX_CHILD_SITEMAPS: usize = 50;

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// Page URLs (`<urlset>` or a text sitemap)
    Urls(Vec<String>),
    /// Child sitemap URLs (`<sitemapindex>`)
    Index(Vec<String>),
}

/// Seeds and warnings produced by resolving one sitemap.
#[derive(Debug, Clone, Default)]
pub struct SitemapOutcome {
    pub seeds: Vec<UrlRecord>,
    pub warnings: Vec<SiteWarning>,
}

// Resolves a sitemap URL into depth-0 seeds whose referrer is the sitemap
pub async fn resolve(fetcher: &Fetcher, sitemap_url: &str) -> SitemapOutcome {
    let mut outcome = SitemapOutcome::default();

    let url = match parse_sitemap_url(sitemap_url) {
        Ok(url) => url,
        Err(e) => {
            outcome.record_error(sitemap_url, e);
            return outcome;
        }
    };

    match load(fetcher, &url).await {
        Ok(SitemapDocument::Urls(locs)) => outcome.add_seeds(&url, locs),
        Ok(SitemapDocument::Index(children)) => {
            debug!(sitemap = %url, children = children.len(), "sitemap index");
            for child in children.into_iter().take(MAX_CHILD_SITEMAPS) {
                let child_url = match parse_sitemap_url(&child) {
                    Ok(u) => u,
                    Err(e) => {
                        outcome.record_error(&child, e);
                        continue;
                    }
                };
                match load(fetcher, &child_url).await {
                    Ok(SitemapDocument::Urls(locs)) => outcome.add_seeds(&child_url, locs),
                    Ok(SitemapDocument::Index(_)) => outcome.record_error(
                        &child,
                        SitemapError::Malformed("nested sitemap index is not followed".to_string()),
                    ),
                    Err(e) => outcome.record_error(&child, e),
                }
            }
        }
        Err(e) => outcome.record_error(sitemap_url, e),
    }

    outcome
}

impl SitemapOutcome {
    fn record_error(&mut self, url: &str, error: SitemapError) {
        warn!(sitemap = url, %error, "sitemap ignored");
        self.warnings.push(SiteWarning::SitemapError {
            url: url.to_string(),
            message: error.to_string(),
        });
    }

    fn add_seeds(&mut self, sitemap: &Url, locs: Vec<String>) {
        for loc in locs {
            match Url::parse(&loc) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {
                    self.seeds
                        .push(UrlRecord::new(url, 0, Some(sitemap.to_string())));
                }
                _ => debug!(entry = %loc, "skipping unusable sitemap entry"),
            }
        }
    }
}

fn parse_sitemap_url(raw: &str) -> Result<Url, SitemapError> {
    let url = Url::parse(raw.trim()).map_err(|e| SitemapError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SitemapError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

async fn load(fetcher: &Fetcher, url: &Url) -> Result<SitemapDocument, SitemapError> {
    let fetched = fetcher.fetch_document(url).await?;
    parse_sitemap(&fetched.body)
}

/// Parses a sitemap body. XML if it starts with '<', plain text otherwise.
pub fn parse_sitemap(body: &str) -> Result<SitemapDocument, SitemapError> {
    let trimmed = body.trim_start_matches('\u{feff}').trim();
    if trimmed.starts_with('<') {
        parse_xml(trimmed)
    } else {
        parse_text(trimmed)
    }
}

fn parse_text(body: &str) -> Result<SitemapDocument, SitemapError> {
    let urls: Vec<String> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| Url::parse(line).is_ok())
        .map(str::to_string)
        .collect();

    if urls.is_empty() {
        return Err(SitemapError::Empty);
    }
    Ok(SitemapDocument::Urls(urls))
}

// Collects the text of every <loc> element. Element names are compared by
// local name, so prefixed namespaces ("<sm:loc>") work too.
fn parse_xml(xml: &str) -> Result<SitemapDocument, SitemapError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<String> = None;
    let mut depth = 0usize;
    let mut in_loc = false;
    let mut current = String::new();
    let mut locs = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if root.is_none() {
                    root = Some(name.clone());
                }
                depth += 1;
                in_loc = name == "loc";
                current.clear();
            }
            Ok(Event::Empty(e)) => {
                if root.is_none() {
                    root = Some(String::from_utf8_lossy(e.local_name().as_ref()).to_string());
                }
            }
            Ok(Event::Text(e)) if in_loc => {
                let text = e
                    .unescape()
                    .map_err(|err| SitemapError::Malformed(err.to_string()))?;
                current.push_str(&text);
            }
            Ok(Event::CData(e)) if in_loc => {
                current.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                if e.local_name().as_ref() == b"loc" {
                    let loc = current.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                    current.clear();
                    in_loc = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SitemapError::Malformed(e.to_string())),
            _ => {}
        }
    }

    if depth != 0 {
        return Err(SitemapError::Malformed("unexpected end of document".to_string()));
    }

    let document = match root.as_deref() {
        Some("urlset") => SitemapDocument::Urls(locs),
        Some("sitemapindex") => SitemapDocument::Index(locs),
        Some(other) => {
            return Err(SitemapError::Malformed(format!(
                "unexpected root element <{}>",
                other
            )))
        }
        None => return Err(SitemapError::Malformed("no root element".to_string())),
    };

    match &document {
        SitemapDocument::Urls(v) | SitemapDocument::Index(v) if v.is_empty() => {
            Err(SitemapError::Empty)
        }
        _ => Ok(document),
    }
}
