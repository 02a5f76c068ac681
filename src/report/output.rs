// src/report/output.rs
// =============================================================================
// Presentation helpers for a SiteReport.
//
// - to_json: the full report, pretty-printed
// - render_text: a human-readable summary (pages table, top terms, warnings)
//
// Both return Strings; deciding where they go (stdout or a file) is up to
// the caller.
// =============================================================================

use std::fmt::Write;

use super::aggregate::SiteReport;
use crate::ngram::RankedTerm;

pub fn to_json(report: &SiteReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

// Renders the report for a terminal:
//
//   URL                                                  STATUS   WORDS  WARNINGS
//   ================================================================================
//   https://example.com/                                 200        512  3
pub fn render_text(report: &SiteReport) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail, so the fmt::Results are ignored
    let _ = writeln!(out, "Site: {}", report.seed_url);
    if let Some(sitemap) = &report.sitemap_url {
        let _ = writeln!(out, "Sitemap: {}", sitemap);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "{:<60} {:<8} {:>6}  {}", "URL", "STATUS", "WORDS", "WARNINGS");
    let _ = writeln!(out, "{}", "=".repeat(86));
    for page in &report.pages {
        let url = truncate(&page.url, 57);
        let status = match (&page.error, page.status) {
            (Some(_), Some(code)) => code.to_string(),
            (Some(_), None) => "ERROR".to_string(),
            (None, Some(code)) => code.to_string(),
            (None, None) => "-".to_string(),
        };
        let _ = writeln!(
            out,
            "{:<60} {:<8} {:>6}  {}",
            url,
            status,
            page.word_count,
            page.warnings.len()
        );
        if let Some(error) = &page.error {
            let _ = writeln!(out, "    error: {}", error);
        }
        for warning in &page.warnings {
            let _ = writeln!(out, "    - {}", warning);
        }
    }
    let _ = writeln!(out);

    write_terms(&mut out, "Top keywords", &report.keywords);
    write_terms(&mut out, "Top bigrams", &report.bigrams);
    write_terms(&mut out, "Top trigrams", &report.trigrams);

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "Site warnings:");
        for warning in &report.warnings {
            let _ = writeln!(out, "  - {}", warning);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Summary:");
    let _ = writeln!(out, "  Pages: {}", report.total_pages);
    let _ = writeln!(out, "  Failed: {}", report.failed_pages);
    let _ = writeln!(out, "  Words: {}", report.total_words);
    if report.partial {
        let _ = writeln!(out, "  (partial: crawl deadline reached)");
    }

    out
}

fn write_terms(out: &mut String, heading: &str, terms: &[RankedTerm]) {
    if terms.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}:", heading);
    for term in terms {
        let _ = writeln!(out, "  {:<40} {}", term.term, term.count);
    }
    let _ = writeln!(out);
}

// Shortens long URLs for the table, respecting char boundaries
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let short: String = text.chars().take(max).collect();
        format!("{}...", short)
    } else {
        text.to_string()
    }
}
