// src/extract/html.rs
// =============================================================================
// This module turns a raw HTML page into the pieces the analyzer needs.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Is built on html5ever, which never rejects input: broken markup is
//   repaired the way a browser would, so extraction cannot fail
// - Decodes HTML entities (&amp;, &eacute;, ...) while parsing
//
// What we pull out:
// - body text, with <script>, <style>, <noscript>, <template> and <title>
//   excluded and whitespace collapsed
// - <title> and <meta name="description">
// - headings h1-h6 in document order (only when asked for)
// - extra tags from a declarative selector list (only when asked for)
// - hyperlinks with their anchor text, resolved against the page's final URL
// - images without a usable alt attribute
// =============================================================================

use scraper::{ElementRef, Html, Node};
use serde::Serialize;
use url::Url;

use super::tags::CompiledTag;

// Elements whose contents never count as page text
const SKIPPED: &[&str] = &["script", "style", "noscript", "template", "title"];

// Elements that do not break a word when they start or end
const INLINE: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "dfn", "em", "font", "i", "kbd",
    "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var",
];

/// A heading found on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// One value collected by an extra-tag selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagFinding {
    pub tag: String,
    pub value: String,
}

/// A hyperlink target and its anchor text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub url: String,
    pub text: String,
}

/// What the extractor should do beyond the always-on parts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions<'a> {
    pub headings: bool,
    pub extra_tags: Option<&'a [CompiledTag]>,
}

/// The structural document extracted from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body_text: String,
    pub headings: Vec<Heading>,
    pub extra_tags: Vec<TagFinding>,
    pub links: Vec<Link>,
    pub images_missing_alt: Vec<String>,
}

// Extracts text, metadata and links from an HTML document
//
// Parameters:
//   html: the page source
//   base_url: the URL the page was finally served from (after redirects),
//             used to resolve relative links
//   options: which optional findings to compute
//
// Headings and extra tags are not looked at unless requested.
pub fn extract(html: &str, base_url: &Url, options: &ExtractOptions<'_>) -> ExtractedPage {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut page = ExtractedPage {
        body_text: element_text(root),
        ..ExtractedPage::default()
    };

    for element in root.descendants().filter_map(ElementRef::wrap) {
        let name = element.value().name();
        match name {
            "title" if page.title.is_none() => {
                let title = collapse_whitespace(&element.text().collect::<String>());
                if !title.is_empty() {
                    page.title = Some(title);
                }
            }
            "meta" if page.description.is_none() => {
                let is_description = element
                    .value()
                    .attr("name")
                    .is_some_and(|n| n.eq_ignore_ascii_case("description"));
                if is_description {
                    if let Some(content) = element.value().attr("content") {
                        page.description = Some(collapse_whitespace(content));
                    }
                }
            }
            "a" => {
                if let Some(url) = element
                    .value()
                    .attr("href")
                    .and_then(|href| resolve_url(base_url, href))
                {
                    page.links.push(Link {
                        url,
                        text: element_text(element),
                    });
                }
            }
            "img" => {
                let has_alt = element
                    .value()
                    .attr("alt")
                    .is_some_and(|alt| !alt.trim().is_empty());
                if !has_alt {
                    let src = element.value().attr("src").unwrap_or_default();
                    let src = resolve_url(base_url, src).unwrap_or_else(|| src.to_string());
                    page.images_missing_alt.push(src);
                }
            }
            _ if options.headings => {
                if let Some(level) = heading_level(name) {
                    let text = element_text(element);
                    if !text.is_empty() {
                        page.headings.push(Heading { level, text });
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(tags) = options.extra_tags {
        page.extra_tags = extract_tags(&document, tags);
    }

    page
}

// Runs every configured selector over the document, in configuration order
fn extract_tags(document: &Html, tags: &[CompiledTag]) -> Vec<TagFinding> {
    let mut findings = Vec::new();

    for tag in tags {
        for element in document.select(&tag.css) {
            let value = match &tag.attribute {
                Some(attr) => element
                    .value()
                    .attr(attr)
                    .map(collapse_whitespace)
                    .unwrap_or_default(),
                None => element_text(element),
            };

            if !value.is_empty() {
                findings.push(TagFinding {
                    tag: tag.label.clone(),
                    value,
                });
            }
        }
    }

    findings
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Visible text under `element`, whitespace collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    collapse_whitespace(&raw)
}

// Walks the subtree, appending text nodes. Block-level elements are padded
// with spaces so "<p>one</p><p>two</p>" reads as two words.
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED.contains(&name) {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    let block = !INLINE.contains(&name);
                    if block {
                        out.push(' ');
                    }
                    collect_text(child_el, out);
                    if block {
                        out.push(' ');
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Resolves a possibly-relative URL to an absolute URL
//
// Examples:
//   base = "https://example.com/page"
//   href = "/docs" -> Some("https://example.com/docs")
//   href = "../other" -> Some("https://example.com/other")
//   href = "#section" -> None (same page)
//   href = "javascript:void(0)" -> None (not HTTP)
//
// The fragment is dropped: "page#a" and "page#b" are the same document.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !is_crawlable(&url) {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

// Only http and https links can be fetched; mailto:, tel:, javascript:,
// data: and file: links are skipped
fn is_crawlable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why walk the tree instead of using `element.text()` everywhere?
//    - text() yields every text node, including <script> and <style> bodies
//    - collect_text() skips those subtrees and inserts word breaks at block
//      boundaries, which text() does not
//
// 2. Why is the title excluded from body text?
//    - Body text feeds the word count and the n-gram tables; the title is
//      reported on its own
//
// 3. Why a `_ if options.headings` match guard?
//    - When heading analysis is off, the level lookup and text collection
//      for h1-h6 never run at all
// -----------------------------------------------------------------------------
