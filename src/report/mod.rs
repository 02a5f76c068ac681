// src/report/mod.rs
// =============================================================================
// The site report.
//
// Submodules:
// - aggregate: folds page reports into a SiteReport, site-level warnings
// - output: JSON and plain-text renderings for the command line
// =============================================================================

mod aggregate;
pub mod output;

pub use aggregate::{aggregate, SiteReport, SiteWarning};
