//! Blog-post repurposing pipeline.

use std::sync::Arc;

use tracing::{info, instrument};

use founderfuel_crawler::PageFetcher;
use founderfuel_shared::{RepurposeResult, Result};
use founderfuel_storage::Storage;

use crate::gateway::{GenerationParams, LanguageModel};
use crate::pipeline::{ProgressReporter, Stage, StageTracker, acquire_page};
use crate::prompt::{TaskKind, build_prompt};
use crate::response::parse_repurpose;

/// Fetch a post, have the model rewrite it, and persist the copy.
#[derive(Clone)]
pub struct RepurposePipeline {
    fetcher: Arc<PageFetcher>,
    model: Arc<dyn LanguageModel>,
    storage: Arc<Storage>,
    model_override: Option<String>,
}

impl RepurposePipeline {
    pub fn new(
        fetcher: Arc<PageFetcher>,
        model: Arc<dyn LanguageModel>,
        storage: Arc<Storage>,
    ) -> Self {
        Self {
            fetcher,
            model,
            storage,
            model_override: None,
        }
    }

    /// Pin repurpose runs to a specific model id.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model_override = model;
        self
    }

    #[instrument(skip_all, fields(url = %url, task = "repurpose"))]
    pub async fn run(&self, url: &str, progress: &dyn ProgressReporter) -> Result<RepurposeResult> {
        let mut tracker = StageTracker::new(progress);
        let outcome = self.run_stages(url, &mut tracker).await;
        let result = tracker.finish(outcome)?;

        info!(id = %result.id, "repurpose complete");
        Ok(result)
    }

    async fn run_stages(&self, url: &str, tracker: &mut StageTracker<'_>) -> Result<RepurposeResult> {
        let page = acquire_page(&self.fetcher, url, tracker).await?;

        tracker.enter(Stage::Prompting);
        let prompt = build_prompt(TaskKind::Repurpose, url, &page);
        let params = GenerationParams::for_task(TaskKind::Repurpose, self.model_override.clone());

        tracker.enter(Stage::Generating);
        let raw = self.model.generate(&prompt, &params).await?;

        tracker.enter(Stage::Parsing);
        let content = parse_repurpose(&raw)?;

        tracker.enter(Stage::Persisting);
        self.storage.insert_repurpose(url, &page, &content).await
    }
}
