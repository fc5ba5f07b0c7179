//! Page acquisition: URL validation, fetching, and content extraction.
//!
//! This crate provides:
//! - [`validate_url`]: the http/https gate in front of every fetch
//! - [`PageFetcher`]: single-shot HTTP fetcher with blocked/timeout classification
//! - [`extract_content`]: HTML to [`founderfuel_shared::PageContent`]

pub mod extract;
pub mod fetch;
pub mod validate;

pub use extract::{DESCRIPTION_FALLBACK, TITLE_FALLBACK, extract_content};
pub use fetch::PageFetcher;
pub use validate::validate_url;
