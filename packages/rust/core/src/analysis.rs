//! Landing-page critique pipeline.

use std::sync::Arc;

use tracing::{info, instrument};

use founderfuel_crawler::PageFetcher;
use founderfuel_shared::{CritiqueResult, Result};
use founderfuel_storage::Storage;

use crate::gateway::{GenerationParams, LanguageModel};
use crate::pipeline::{ProgressReporter, Stage, StageTracker, acquire_page};
use crate::prompt::{TaskKind, build_prompt};
use crate::response::parse_critique;

/// Fetch a page, have the model score it, and persist the critique.
#[derive(Clone)]
pub struct AnalysisPipeline {
    fetcher: Arc<PageFetcher>,
    model: Arc<dyn LanguageModel>,
    storage: Arc<Storage>,
    model_override: Option<String>,
}

impl AnalysisPipeline {
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

    /// Pin critique runs to a specific model id.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model_override = model;
        self
    }

    /// Run the critique for `url` and return the stored result.
    ///
    /// Nothing is written unless every stage before `Persisting` succeeds.
    #[instrument(skip_all, fields(url = %url, task = "critique"))]
    pub async fn run(&self, url: &str, progress: &dyn ProgressReporter) -> Result<CritiqueResult> {
        let mut tracker = StageTracker::new(progress);
        let outcome = self.run_stages(url, &mut tracker).await;
        let result = tracker.finish(outcome)?;

        info!(id = %result.id, overall = result.overall_score, "critique complete");
        Ok(result)
    }

    async fn run_stages(&self, url: &str, tracker: &mut StageTracker<'_>) -> Result<CritiqueResult> {
        let page = acquire_page(&self.fetcher, url, tracker).await?;

        tracker.enter(Stage::Prompting);
        let prompt = build_prompt(TaskKind::Critique, url, &page);
        let params = GenerationParams::for_task(TaskKind::Critique, self.model_override.clone());

        tracker.enter(Stage::Generating);
        let raw = self.model.generate(&prompt, &params).await?;

        tracker.enter(Stage::Parsing);
        let scores = parse_critique(&raw)?;

        tracker.enter(Stage::Persisting);
        self.storage.insert_critique(url, &page, &scores).await
    }
}
