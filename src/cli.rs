//! Command-line interface definitions for News Vault.
//!
//! Every flag overrides the matching key of the YAML configuration. Most can
//! also be set through environment variables, which suits cron and systemd
//! timers that trigger the daily run.

use crate::config::PipelineConfig;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for a single pipeline run.
///
/// # Examples
///
/// ```sh
/// # Run with built-in defaults in the current working tree
/// news_vault
///
/// # Use a config file and a separate data repository
/// news_vault --config pipeline.yaml --work-dir /srv/news-data
///
/// # Scrape and write the file without touching git or dvc
/// news_vault --skip-publish --no-retry
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a pipeline YAML file
    #[arg(short, long, env = "NEWS_VAULT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output JSON file, relative to the working directory
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Git/DVC working tree to write into and publish from
    #[arg(short, long, env = "NEWS_VAULT_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Write the JSON file but skip dvc and git
    #[arg(long)]
    pub skip_publish: bool,

    /// Fail a stage on its first error instead of retrying
    #[arg(long)]
    pub no_retry: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(output_file) = &self.output_file {
            config.output_file = output_file.clone();
        }
        if let Some(work_dir) = &self.work_dir {
            config.work_dir = work_dir.clone();
        }
        if self.skip_publish {
            config.skip_publish = true;
        }
        if self.no_retry {
            config.retry.retries = 0;
        }
    }
}
