// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging
// 3. Build the page (from a template or the built-in one)
// 4. Run the pipeline once and write the page (or a JSON report)
// 5. Exit with proper code (0 = success, 2 = error)
//
// Errors are caught once, here, and only logged. A failed run never writes
// the output file, so whatever was there before stays.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use mdview::cli::Cli;
use mdview::pipeline::Highlighter;
use mdview::{init_service, logging, Fetcher, Page, ServiceConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<()> {
    let config = ServiceConfig::from(&cli);
    let source = cli.command.source();
    let highlighter = Highlighter::new();

    let mut page = match &cli.template {
        Some(path) => {
            let template = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read template {}", path.display()))?;
            Page::new(&template, &config.container_id)?
        }
        None => Page::blank(&config.container_id, &highlighter.stylesheet()),
    };

    let fetcher = Fetcher::new(config.md_root.clone())?;
    let rendered = init_service(&source, &config, &fetcher, &highlighter, &mut page)
        .await
        .with_context(|| format!("failed to render {}", source.describe()))?;

    info!(images = rendered.images.len(), "page rendered");

    if let Some(out) = cli.out.as_deref() {
        write_page(&page, out).await?;
    } else if !cli.json {
        print!("{}", page.to_html());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    }

    Ok(())
}

async fn write_page(page: &Page, out: &Path) -> Result<()> {
    tokio::fs::write(out, page.to_html())
        .await
        .with_context(|| format!("failed to write {}", out.display()))?;
    info!(path = %out.display(), "page written");
    Ok(())
}
