//! # News Vault
//!
//! A daily scrape-and-archive job. Each invocation performs one pipeline run:
//! it pulls article teasers from a fixed set of news front pages, cleans the
//! text, and commits the result to a DVC-tracked JSON file.
//!
//! ## Usage
//!
//! ```sh
//! news_vault --config pipeline.yaml --work-dir /srv/news-data
//! ```
//!
//! Scheduling is left to cron, a systemd timer or a workflow engine; a
//! non-zero exit marks the run as failed for whatever triggered it.
//!
//! ## Architecture
//!
//! 1. **Collect**: Fetch each source page and extract `<article>` title/description pairs
//! 2. **Normalize**: Strip markup and collapse whitespace in every field
//! 3. **Archive**: Overwrite the JSON file, then `dvc add`, `git add`, `git commit`,
//!    `dvc push`, `git push`

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;
mod vcs;

use cli::Cli;
use config::PipelineConfig;
use scrapers::HttpFetcher;
use utils::ensure_writable_dir;
use vcs::{ProcessRunner, check_tool_available};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "news_vault starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = match PipelineConfig::load(args.config.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return Err(e);
        }
    };
    args.apply(&mut config);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration after command-line overrides");
        return Err(e);
    }
    debug!(?config, "Effective configuration");

    // ---- Preflight ----
    if !config.skip_publish {
        for tool in [&config.tools.dvc, &config.tools.git] {
            if let Err(e) = check_tool_available(tool).await {
                error!(%tool, error = %e, "Required tool is unavailable");
                return Err(e.into());
            }
        }
    }

    let output_dir = config
        .output_path()
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| config.work_dir.clone());
    if let Err(e) = ensure_writable_dir(&output_dir).await {
        error!(
            path = %output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Run ----
    let fetcher = HttpFetcher::new();
    let runner = ProcessRunner;
    let report = match pipeline::run(&config, &fetcher, &runner).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Pipeline run failed");
            return Err(e);
        }
    };

    info!(
        started_at = %report.started_at,
        secs = report.elapsed.as_secs(),
        millis = report.elapsed.subsec_millis(),
        articles = report.articles.len(),
        published = report.outcomes.iter().filter(|o| o.is_success()).count(),
        path = %report.output_path.display(),
        "Execution complete"
    );

    Ok(())
}
