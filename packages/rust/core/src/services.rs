//! Wiring: build the shared collaborators once and hand them to pipelines.

use std::sync::Arc;

use founderfuel_crawler::PageFetcher;
use founderfuel_shared::{AppConfig, OpenRouterConfig, Result, expand_home};
use founderfuel_storage::Storage;

use crate::analysis::AnalysisPipeline;
use crate::gateway::{LanguageModel, OpenRouterModel};
use crate::pipeline::ScrapePipeline;
use crate::repurpose::RepurposePipeline;

/// Every pipeline plus the storage handle they share.
#[derive(Clone)]
pub struct Services {
    pub scrape: ScrapePipeline,
    pub analysis: AnalysisPipeline,
    pub repurpose: RepurposePipeline,
    pub storage: Arc<Storage>,
}

impl Services {
    /// Assemble pipelines around already-built collaborators.
    pub fn new(
        fetcher: Arc<PageFetcher>,
        model: Arc<dyn LanguageModel>,
        storage: Arc<Storage>,
        openrouter: &OpenRouterConfig,
    ) -> Self {
        Self {
            scrape: ScrapePipeline::new(Arc::clone(&fetcher), Arc::clone(&storage)),
            analysis: AnalysisPipeline::new(
                Arc::clone(&fetcher),
                Arc::clone(&model),
                Arc::clone(&storage),
            )
            .with_model(openrouter.critique_model.clone()),
            repurpose: RepurposePipeline::new(fetcher, model, Arc::clone(&storage))
                .with_model(openrouter.repurpose_model.clone()),
            storage,
        }
    }

    /// Build everything from config: open the database, create the fetcher,
    /// and connect to OpenRouter (requires the API key env var).
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let model = OpenRouterModel::from_config(config)?;
        let fetcher = PageFetcher::new(&config.fetch)?;
        let storage = open_storage(config).await?;

        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(model),
            Arc::new(storage),
            &config.openrouter,
        ))
    }
}

/// Open the configured database, expanding a leading `~/`.
pub async fn open_storage(config: &AppConfig) -> Result<Storage> {
    let path = expand_home(&config.storage.database_path)?;
    Storage::open(&path).await
}
