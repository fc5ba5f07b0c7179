//! Pipeline orchestration and model integration for FounderFuel.
//!
//! This crate ties the crawler, the language model, and storage together into
//! the three end-to-end runs: [`ScrapePipeline`], [`AnalysisPipeline`], and
//! [`RepurposePipeline`].

pub mod analysis;
pub mod gateway;
pub mod pipeline;
pub mod prompt;
pub mod repurpose;
pub mod response;
pub mod services;

pub use analysis::AnalysisPipeline;
pub use gateway::{GenerationParams, LanguageModel, OpenRouterModel};
pub use pipeline::{ProgressReporter, ScrapePipeline, SilentProgress, Stage};
pub use prompt::{TaskKind, build_prompt};
pub use repurpose::RepurposePipeline;
pub use response::{overall_score, parse_critique, parse_repurpose, strip_fences};
pub use services::{Services, open_storage};
