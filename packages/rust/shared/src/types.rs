//! Core domain types: extracted page content and the persisted records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of characters kept from a page body.
pub const BODY_TEXT_LIMIT: usize = 5000;

/// Lowest and highest valid critique sub-score.
pub const SCORE_MIN: u8 = 1;
pub const SCORE_MAX: u8 = 10;

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for persisted record identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Generate a new time-sortable record identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// PageContent
// ---------------------------------------------------------------------------

/// Normalized content extracted from one HTML page.
///
/// Lives only for the pipeline run that produced it; the persisted form is
/// [`ExtractionRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    pub title: String,
    pub description: String,
    /// Whitespace-collapsed body text, at most [`BODY_TEXT_LIMIT`] characters.
    pub body_text: String,
}

// ---------------------------------------------------------------------------
// Model outputs (before persistence)
// ---------------------------------------------------------------------------

/// Validated critique scores parsed from a model response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CritiqueScores {
    pub headline_score: u8,
    pub value_score: u8,
    pub cta_score: u8,
    pub trust_score: u8,
    /// Rounded mean of the four sub-scores (ties round up).
    pub overall_score: u8,
    pub feedback: String,
}

/// Validated social/newsletter copy parsed from a model response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepurposedContent {
    pub twitter_thread: String,
    pub linkedin_post: String,
    pub newsletter: String,
}

// ---------------------------------------------------------------------------
// Persisted records
// ---------------------------------------------------------------------------

/// One successful fetch + extract, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRecord {
    pub id: RecordId,
    pub url: String,
    pub title: String,
    pub description: String,
    pub body_text: String,
    pub scraped_at: DateTime<Utc>,
}

/// A scored marketing critique of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CritiqueResult {
    pub id: RecordId,
    pub url: String,
    pub headline_score: u8,
    pub value_score: u8,
    pub cta_score: u8,
    pub trust_score: u8,
    pub overall_score: u8,
    pub feedback: String,
    pub analyzed_at: DateTime<Utc>,
}

/// Social and newsletter copy generated from one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepurposeResult {
    pub id: RecordId,
    pub url: String,
    pub title: String,
    pub twitter_thread: String,
    pub linkedin_post: String,
    pub newsletter: String,
    pub created_at: DateTime<Utc>,
}
