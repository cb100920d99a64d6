//! Pipeline configuration.
//!
//! A [`PipelineConfig`] carries everything one run needs: the source
//! endpoints, the CSS selectors used to pick articles apart, the output file,
//! the version-control tools and the per-stage retry policy. It is loaded from
//! an optional YAML file; any key left out takes the default below.
//!
//! ```yaml
//! name: complete_data_management
//! sources:
//!   - https://www.dawn.com
//!   - https://www.bbc.com
//! output_file: articles.json
//! work_dir: /srv/news-data
//! retry:
//!   retries: 1
//!   delay_secs: 300
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Top-level configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name used to tag log lines for this pipeline.
    pub name: String,
    /// Endpoints to scrape, in the order their articles are concatenated.
    pub sources: Vec<String>,
    pub selectors: SelectorConfig,
    /// Output file, relative to `work_dir` unless absolute.
    pub output_file: PathBuf,
    /// Working tree where git and dvc are already initialized.
    pub work_dir: PathBuf,
    pub commit_message: String,
    pub tools: ToolConfig,
    pub retry: RetryConfig,
    /// Write the JSON file but do not invoke git or dvc.
    pub skip_publish: bool,
}

/// CSS selectors used by the collector.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub article: String,
    pub title: String,
    pub description: String,
}

/// Executables for the version-control step.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolConfig {
    pub git: String,
    pub dvc: String,
}

/// Retry policy applied to each stage independently.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Extra attempts after the first failure.
    pub retries: usize,
    /// Seconds to wait before re-running a failed stage.
    pub delay_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "complete_data_management".to_string(),
            sources: vec![
                "https://www.dawn.com".to_string(),
                "https://www.bbc.com".to_string(),
            ],
            selectors: SelectorConfig::default(),
            output_file: PathBuf::from("articles.json"),
            work_dir: PathBuf::from("."),
            commit_message: "Update data".to_string(),
            tools: ToolConfig::default(),
            retry: RetryConfig::default(),
            skip_publish: false,
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            article: "article".to_string(),
            title: "h2".to_string(),
            description: "p".to_string(),
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            dvc: "dvc".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 1,
            delay_secs: 300,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl PipelineConfig {
    /// Load configuration from `path`, or fall back to defaults when `None`.
    ///
    /// The loaded configuration is validated before it is returned.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).await?;
                let config = Self::from_yaml(&raw)?;
                info!(path = %path.display(), "Loaded configuration file");
                config
            }
            None => {
                info!("No configuration file given; using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document into a configuration.
    pub fn from_yaml(raw: &str) -> Result<Self, Box<dyn Error>> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        for source in &self.sources {
            let url = Url::parse(source)
                .map_err(|e| format!("invalid source url {source:?}: {e}"))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!("source url {source:?} must use http or https").into());
            }
        }
        if self.output_file.as_os_str().is_empty() {
            return Err("output_file must not be empty".into());
        }
        Ok(())
    }

    /// Full path of the output file.
    pub fn output_path(&self) -> PathBuf {
        self.work_dir.join(&self.output_file)
    }
}
