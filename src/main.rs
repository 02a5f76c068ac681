// src/main.rs
// =============================================================================
// This is the entry point of the command-line tool.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, written to stderr so stdout stays clean)
// 3. Run the analysis
// 4. Print or save the report
// 5. Exit with a code: 0 = all pages analyzed, 1 = some pages failed,
//    2 = error (bad arguments, output could not be written)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, OutputFormat};
use seo_analyzer::report::output;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG wins when set; otherwise info (or debug with --verbose) for
// this crate only
fn init_logging(verbose: bool) {
    let default = if verbose {
        "seo_analyzer=debug"
    } else {
        "seo_analyzer=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Returns:
//   Ok(0) = report produced, every page analyzed
//   Ok(1) = report produced, some pages failed
//   Err   = configuration or output error
async fn run(cli: Cli) -> Result<i32> {
    let options = cli.analyze_options();

    let report = seo_analyzer::analyze(&cli.site, cli.sitemap.as_deref(), options)
        .await
        .context("cannot start analysis")?;

    let rendered = match cli.output_format {
        OutputFormat::Json => output::to_json(&report).context("failed to serialize report")?,
        OutputFormat::Text => output::render_text(&report),
    };

    match &cli.output_file {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", rendered),
    }

    if report.has_failures() {
        Ok(1)
    } else {
        Ok(0)
    }
}
