//! Shared types, error model, and configuration for FounderFuel.
//!
//! This crate is the foundation depended on by all other FounderFuel crates.
//! It provides:
//! - [`FounderFuelError`]: the unified error type
//! - Domain types ([`PageContent`], [`ExtractionRecord`], [`CritiqueResult`], [`RepurposeResult`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchConfig, OpenRouterConfig, ServerConfig, StorageConfig, config_dir,
    config_file_path, expand_home, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{FounderFuelError, Result};
pub use types::{
    BODY_TEXT_LIMIT, CritiqueResult, CritiqueScores, ExtractionRecord, PageContent, RecordId,
    RepurposeResult, RepurposedContent, SCORE_MAX, SCORE_MIN,
};
