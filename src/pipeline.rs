//! Run orchestration: Collector → Normalizer → Archiver.
//!
//! Each stage implements [`Stage`] and hands its typed output straight to the
//! next one. Stages are wrapped in [`RetryStage`], which re-runs only the
//! failed stage from scratch; the outputs of stages that already succeeded
//! are reused rather than recomputed.
//!
//! # Retry Strategy
//!
//! - `retries` extra attempts per stage (one by default)
//! - Fixed delay between attempts (five minutes by default)
//! - Random jitter (0-250ms) added when the delay is non-zero
//!
//! A run either finishes all three stages or fails as a whole. The JSON file
//! is only written once the collection has been fully normalized.

use crate::config::PipelineConfig;
use crate::models::Article;
use crate::normalize::normalize;
use crate::outputs::json::write_articles;
use crate::scrapers::{self, PageFetcher, articles::ArticleSelectors};
use crate::vcs::{CommandOutcome, CommandRunner, publish_commands, run_sequence};
use chrono::{DateTime, Local};
use rand::{Rng, rng};
use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// One unit of work in the pipeline.
pub trait Stage {
    type Input;
    type Output;

    /// Stage name used in logs.
    const NAME: &'static str;

    /// Run the stage once over `input`.
    async fn run(&self, input: &Self::Input) -> Result<Self::Output, Box<dyn Error>>;
}

/// Wrapper that re-runs a failed [`Stage`] after a fixed delay.
pub struct RetryStage<S> {
    inner: S,
    retries: usize,
    delay: Duration,
}

impl<S: Stage> RetryStage<S> {
    pub fn new(inner: S, retries: usize, delay: Duration) -> Self {
        Self {
            inner,
            retries,
            delay,
        }
    }
}

impl<S: Stage> Stage for RetryStage<S> {
    type Input = S::Input;
    type Output = S::Output;

    const NAME: &'static str = S::NAME;

    #[instrument(level = "info", skip_all, fields(stage = S::NAME))]
    async fn run(&self, input: &Self::Input) -> Result<Self::Output, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.run(input).await {
                Ok(output) => {
                    info!(
                        attempt = attempt + 1,
                        elapsed_ms = attempt_t0.elapsed().as_millis(),
                        "Stage completed"
                    );
                    return Ok(output);
                }
                Err(e) => {
                    attempt += 1;
                    let elapsed_ms_total = total_t0.elapsed().as_millis();

                    if attempt > self.retries {
                        error!(
                            attempt,
                            max = self.retries,
                            elapsed_ms_total,
                            error = %e,
                            "Stage exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = if self.delay.is_zero() {
                        self.delay
                    } else {
                        let jitter_ms: u64 = rng().random_range(0..=250);
                        self.delay + Duration::from_millis(jitter_ms)
                    };

                    warn!(
                        attempt,
                        max = self.retries,
                        elapsed_ms_total,
                        ?delay,
                        error = %e,
                        "Stage failed; retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Fetches every configured source and extracts its articles.
pub struct Collector<'a, F> {
    pub fetcher: &'a F,
    pub sources: &'a [String],
    pub selectors: ArticleSelectors,
}

impl<F: PageFetcher> Stage for Collector<'_, F> {
    type Input = ();
    type Output = Vec<Article>;

    const NAME: &'static str = "collect";

    async fn run(&self, _input: &()) -> Result<Vec<Article>, Box<dyn Error>> {
        scrapers::collect(self.fetcher, self.sources, &self.selectors).await
    }
}

/// Cleans the text of every collected article.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Stage for Normalizer {
    type Input = Vec<Article>;
    type Output = Vec<Article>;

    const NAME: &'static str = "normalize";

    async fn run(&self, input: &Vec<Article>) -> Result<Vec<Article>, Box<dyn Error>> {
        Ok(normalize(input.clone()))
    }
}

/// What the archiver left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveReport {
    pub output_path: PathBuf,
    /// One entry per publish command; empty when publishing is skipped.
    pub outcomes: Vec<CommandOutcome>,
}

/// Writes the JSON file and publishes it through dvc and git.
pub struct Archiver<'a, R> {
    pub runner: &'a R,
    pub config: &'a PipelineConfig,
}

impl<R: CommandRunner> Stage for Archiver<'_, R> {
    type Input = Vec<Article>;
    type Output = ArchiveReport;

    const NAME: &'static str = "archive";

    async fn run(&self, input: &Vec<Article>) -> Result<ArchiveReport, Box<dyn Error>> {
        let output_path = self.config.output_path();
        write_articles(&output_path, input).await?;

        if self.config.skip_publish {
            info!(path = %output_path.display(), "Publishing skipped");
            return Ok(ArchiveReport {
                output_path,
                outcomes: Vec::new(),
            });
        }

        let commands = publish_commands(
            &self.config.tools,
            &self.config.output_file,
            &self.config.commit_message,
        );
        let outcomes = run_sequence(self.runner, &commands, &self.config.work_dir).await?;
        Ok(ArchiveReport {
            output_path,
            outcomes,
        })
    }
}

/// Summary of a completed pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    /// The cleaned articles that were archived.
    pub articles: Vec<Article>,
    pub output_path: PathBuf,
    pub outcomes: Vec<CommandOutcome>,
}

/// Execute one pipeline run.
///
/// # Errors
///
/// Returns the error of the first stage that still fails after its retries.
/// Later stages do not run.
#[instrument(level = "info", skip_all, fields(pipeline = %config.name))]
pub async fn run<F, R>(
    config: &PipelineConfig,
    fetcher: &F,
    runner: &R,
) -> Result<RunReport, Box<dyn Error>>
where
    F: PageFetcher,
    R: CommandRunner,
{
    let started_at = Local::now();
    let t0 = Instant::now();
    info!(%started_at, sources = config.sources.len(), "Pipeline run starting");

    let retries = config.retry.retries;
    let delay = config.retry.delay();

    let collector = RetryStage::new(
        Collector {
            fetcher,
            sources: &config.sources,
            selectors: ArticleSelectors::new(&config.selectors)?,
        },
        retries,
        delay,
    );
    let normalizer = RetryStage::new(Normalizer, retries, delay);
    let archiver = RetryStage::new(Archiver { runner, config }, retries, delay);

    let raw = collector.run(&()).await?;
    info!(count = raw.len(), "Collected articles");

    let articles = normalizer.run(&raw).await?;
    info!(count = articles.len(), "Normalized articles");

    let archived = archiver.run(&articles).await?;

    let elapsed = t0.elapsed();
    info!(
        ?elapsed,
        articles = articles.len(),
        commands = archived.outcomes.len(),
        path = %archived.output_path.display(),
        "Pipeline run complete"
    );

    Ok(RunReport {
        started_at,
        elapsed,
        articles,
        output_path: archived.output_path,
        outcomes: archived.outcomes,
    })
}
