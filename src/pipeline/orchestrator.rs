//! Run orchestration - fans one task out per URL
//!
//! This module contains the main run loop, including:
//! - Spawning one task per input URL, bounded by a semaphore
//! - Fetching, extracting and diffing each document
//! - Routing every URL to exactly one of the two sinks
//! - Aggregating counts and writing the health report

use super::record::{DeadLetter, ExtractedRecord};
use super::snapshot::SnapshotCache;
use crate::config::{Config, OutputConfig, PipelineConfig};
use crate::extract::{DiffDetector, Extractor, FingerprintDiff, SelectorExtractor};
use crate::fetch::FetchClient;
use crate::output::{write_health_report, HealthReport, JsonlSink};
use crate::{GuardError, GuardResult};
use chrono::Utc;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Error code attached to every per-URL failure log line
pub const SCRAPE_FAIL: &str = "SCRAPE_FAIL";

/// Counts reported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub ok: usize,
    pub failed: usize,
    pub total: usize,
    pub struct_changes: usize,
    pub run_id: String,
}

#[derive(Debug, Default)]
struct RunCounters {
    ok: AtomicUsize,
    failed: AtomicUsize,
    struct_changes: AtomicUsize,
}

/// State shared by every task of one run
struct TaskContext {
    field: String,
    fetcher: FetchClient,
    extractor: Arc<dyn Extractor>,
    diff: Arc<dyn DiffDetector>,
    cache: SnapshotCache,
    data: JsonlSink,
    dead_letter: JsonlSink,
    counters: RunCounters,
}

/// A per-URL failure and the step it happened in
struct StepError {
    step: &'static str,
    error: GuardError,
}

impl StepError {
    fn at(step: &'static str) -> impl FnOnce(GuardError) -> Self {
        move |error| Self { step, error }
    }
}

/// Drives one pipeline over a list of URLs
///
/// The orchestrator owns the run's fetch client (and with it the shared rate
/// limiter, circuit breaker and connection pool). [`Orchestrator::run`]
/// consumes it, so all of that state lives for exactly one run.
pub struct Orchestrator {
    pipeline: PipelineConfig,
    output: OutputConfig,
    max_concurrency: usize,
    fetcher: FetchClient,
    extractor: Arc<dyn Extractor>,
    diff: Arc<dyn DiffDetector>,
}

impl Orchestrator {
    /// Creates an orchestrator for `pipeline` with the selector extractor and
    /// fingerprint diff detector
    ///
    /// # Arguments
    ///
    /// * `config` - Fetch, backoff, breaker and output settings
    /// * `pipeline` - The pipeline to run
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to run
    /// * `Err(GuardError::Client)` - The HTTP client could not be built
    pub fn new(config: &Config, pipeline: PipelineConfig) -> GuardResult<Self> {
        let fetcher = FetchClient::from_config(config)?;
        let extractor = Arc::new(SelectorExtractor::new(&pipeline.candidates));

        Ok(Self {
            pipeline,
            output: config.output.clone(),
            max_concurrency: config.fetch.max_concurrency,
            fetcher,
            extractor,
            diff: Arc::new(FingerprintDiff),
        })
    }

    /// Replaces the field extractor
    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replaces the structural diff detector
    pub fn with_diff_detector(mut self, diff: Arc<dyn DiffDetector>) -> Self {
        self.diff = diff;
        self
    }

    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    /// Processes every URL and writes the health report
    ///
    /// Both sinks are truncated first. Each URL ends up as exactly one line
    /// in either the data sink or the dead-letter sink; per-URL failures never
    /// abort the run. Only sink creation and the health report write can fail
    /// the run as a whole.
    pub async fn run(self, urls: Vec<String>) -> GuardResult<RunSummary> {
        let run_id = Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
        let span = tracing::info_span!("run", run_id = %run_id, pipeline = %self.pipeline.name);

        self.run_inner(urls, run_id).instrument(span).await
    }

    async fn run_inner(self, urls: Vec<String>, run_id: String) -> GuardResult<RunSummary> {
        tracing::info!(
            urls = urls.len(),
            max_concurrency = self.max_concurrency,
            "Starting run"
        );

        let context = Arc::new(TaskContext {
            field: self.pipeline.field.clone(),
            fetcher: self.fetcher,
            extractor: self.extractor,
            diff: self.diff,
            cache: SnapshotCache::new(&self.output.cache_dir),
            data: JsonlSink::create(Path::new(&self.output.data_path)).await?,
            dead_letter: JsonlSink::create(Path::new(&self.output.dead_letter_path)).await?,
            counters: RunCounters::default(),
        });
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency.max(1)));

        let mut handles: Vec<(String, JoinHandle<()>)> = Vec::with_capacity(urls.len());
        for url in urls {
            let context = context.clone();
            let semaphore = semaphore.clone();
            let task_url = url.clone();
            let span = tracing::info_span!("url", url = %url);

            let handle = tokio::spawn(
                async move {
                    match semaphore.acquire_owned().await {
                        Ok(_permit) => context.process(&task_url).await,
                        Err(e) => context.fail(&task_url, "schedule", e).await,
                    }
                }
                .instrument(span),
            );
            handles.push((url, handle));
        }

        for (url, handle) in handles {
            if let Err(e) = handle.await {
                tracing::error!(url = %url, step = "task", error_code = SCRAPE_FAIL, error = %e, "Task aborted");
                context.fail(&url, "task", format!("task failed: {}", e)).await;
            }
        }

        let counters = &context.counters;
        let ok = counters.ok.load(Ordering::SeqCst);
        let failed = counters.failed.load(Ordering::SeqCst);
        let struct_changes = counters.struct_changes.load(Ordering::SeqCst);

        // releases the connection pool before the report is written
        drop(context);

        let report = HealthReport::new(&self.pipeline.name, &run_id, ok, failed, struct_changes);
        write_health_report(Path::new(&self.output.health_path), &report).await?;

        tracing::info!(
            ok,
            failed,
            total = report.total,
            struct_changes,
            "Run complete"
        );

        Ok(RunSummary {
            ok,
            failed,
            total: report.total,
            struct_changes,
            run_id,
        })
    }
}

impl TaskContext {
    /// Runs one URL to its terminal record
    async fn process(&self, url: &str) {
        let record = match self.extract(url).await {
            Ok(record) => record,
            Err(StepError { step, error }) => return self.fail(url, step, error).await,
        };

        if let Err(e) = self.data.append(&record).await {
            return self.fail(url, "write", e).await;
        }

        self.counters.ok.fetch_add(1, Ordering::SeqCst);
        if record.struct_changed {
            self.counters.struct_changes.fetch_add(1, Ordering::SeqCst);
        }
        tracing::info!(
            url = %url,
            step = "write",
            selector_strategy = %record.selector_strategy,
            struct_changed = record.struct_changed,
            "Extracted"
        );
    }

    async fn extract(&self, url: &str) -> Result<ExtractedRecord, StepError> {
        let document = self
            .fetcher
            .fetch(url)
            .await
            .map_err(GuardError::from)
            .map_err(StepError::at("fetch"))?;
        tracing::debug!(url = %url, step = "fetch", bytes = document.len(), "Fetched");

        let extraction = self.extractor.extract(&document);

        let previous = self
            .cache
            .swap(url, &document)
            .await
            .map_err(StepError::at("snapshot"))?;

        let diff = self.diff.diff(previous.as_deref(), &document);
        if diff.changed {
            tracing::warn!(
                url = %url,
                step = "diff",
                prev = diff.prev_fingerprint.as_deref().unwrap_or_default(),
                curr = %diff.curr_fingerprint,
                "Structure changed since last snapshot"
            );
        }

        Ok(ExtractedRecord::new(url, &self.field, &extraction, &diff))
    }

    /// Writes the dead letter for `url`
    async fn fail(&self, url: &str, step: &str, error: impl std::fmt::Display) {
        self.counters.failed.fetch_add(1, Ordering::SeqCst);
        tracing::error!(url = %url, step, error_code = SCRAPE_FAIL, error = %error, "Scrape failed");

        if let Err(e) = self.dead_letter.append(&DeadLetter::new(url, &error)).await {
            tracing::error!(url = %url, step = "dead_letter", error = %e, "Failed to record dead letter");
        }
    }
}
