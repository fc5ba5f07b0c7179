//! Pipeline stages, progress reporting, and the stand-alone scrape run.
//!
//! Every run walks a fixed sequence of [`Stage`]s. The first failing stage
//! ends the run: the reporter sees `failed(stage, &err)` and the error is
//! returned to the caller unchanged.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use founderfuel_crawler::{PageFetcher, extract_content, validate_url};
use founderfuel_shared::{ExtractionRecord, FounderFuelError, PageContent, Result};
use founderfuel_storage::Storage;

// ---------------------------------------------------------------------------
// Stages & progress
// ---------------------------------------------------------------------------

/// One step of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validating,
    Fetching,
    Extracting,
    Prompting,
    Generating,
    Parsing,
    Persisting,
    Done,
}

impl Stage {
    /// Human-readable label for progress displays.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validating => "Validating URL",
            Self::Fetching => "Fetching page",
            Self::Extracting => "Extracting content",
            Self::Prompting => "Building prompt",
            Self::Generating => "Waiting for model",
            Self::Parsing => "Parsing response",
            Self::Persisting => "Saving result",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn stage(&self, stage: Stage);
    /// Called once when the run fails; `stage` is where it stopped.
    fn failed(&self, stage: Stage, error: &FounderFuelError);
    /// Called once when the run completes successfully.
    fn done(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage(&self, _stage: Stage) {}
    fn failed(&self, _stage: Stage, _error: &FounderFuelError) {}
    fn done(&self) {}
}

/// Tracks the current stage of one run and forwards transitions.
pub(crate) struct StageTracker<'a> {
    progress: &'a dyn ProgressReporter,
    current: Stage,
}

impl<'a> StageTracker<'a> {
    pub(crate) fn new(progress: &'a dyn ProgressReporter) -> Self {
        Self {
            progress,
            current: Stage::Validating,
        }
    }

    pub(crate) fn enter(&mut self, stage: Stage) {
        debug!(stage = ?stage, "entering stage");
        self.current = stage;
        self.progress.stage(stage);
    }

    /// Close the run: `Done` on success, `failed` at the current stage otherwise.
    pub(crate) fn finish<T>(mut self, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => {
                self.enter(Stage::Done);
                self.progress.done();
                Ok(value)
            }
            Err(err) => {
                warn!(stage = ?self.current, error = %err, "pipeline run failed");
                self.progress.failed(self.current, &err);
                Err(err)
            }
        }
    }
}

/// Validate, fetch, and extract: the steps every pipeline starts with.
pub(crate) async fn acquire_page(
    fetcher: &PageFetcher,
    url: &str,
    tracker: &mut StageTracker<'_>,
) -> Result<PageContent> {
    tracker.enter(Stage::Validating);
    let parsed = validate_url(url)?;

    tracker.enter(Stage::Fetching);
    let html = fetcher.fetch(&parsed).await?;

    tracker.enter(Stage::Extracting);
    let page = extract_content(&html);
    debug!(
        title = %page.title,
        body_chars = page.body_text.chars().count(),
        "content extracted"
    );

    Ok(page)
}

// ---------------------------------------------------------------------------
// Scrape
// ---------------------------------------------------------------------------

/// Fetch + extract + persist, with no model involvement.
#[derive(Clone)]
pub struct ScrapePipeline {
    fetcher: Arc<PageFetcher>,
    storage: Arc<Storage>,
}

impl ScrapePipeline {
    pub fn new(fetcher: Arc<PageFetcher>, storage: Arc<Storage>) -> Self {
        Self { fetcher, storage }
    }

    /// Run the pipeline for `url` and return the stored extraction.
    #[instrument(skip_all, fields(url = %url, task = "scrape"))]
    pub async fn run(&self, url: &str, progress: &dyn ProgressReporter) -> Result<ExtractionRecord> {
        let mut tracker = StageTracker::new(progress);
        let outcome = self.run_stages(url, &mut tracker).await;
        let record = tracker.finish(outcome)?;

        info!(id = %record.id, "scrape complete");
        Ok(record)
    }

    async fn run_stages(&self, url: &str, tracker: &mut StageTracker<'_>) -> Result<ExtractionRecord> {
        let page = acquire_page(&self.fetcher, url, tracker).await?;

        tracker.enter(Stage::Persisting);
        self.storage.insert_extraction(url, &page).await
    }
}
