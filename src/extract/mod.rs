// src/extract/mod.rs
// =============================================================================
// Content extraction: raw HTML in, plain text + structure out.
//
// Submodules:
// - html: the extractor itself (text, title, description, headings, links)
// - tags: the declarative list of extra tags to collect
// =============================================================================

mod html;
mod tags;

pub use html::{
    collapse_whitespace, extract, resolve_url, ExtractOptions, ExtractedPage, Heading, Link,
    TagFinding,
};
pub use tags::{default_extra_tags, CompiledTag, TagSelector};
