//! Route handlers for the `/api` surface and `/health`.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use founderfuel_core::SilentProgress;
use founderfuel_shared::{CritiqueResult, ExtractionRecord, RepurposeResult};

use crate::app::AppState;
use crate::error::ApiError;

/// Records returned when `limit` is absent or unusable.
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;
/// Upper bound on `limit`.
pub const MAX_HISTORY_LIMIT: u32 = 100;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    limit: Option<String>,
}

/// Resolve the `limit` query parameter: missing, non-numeric or zero falls
/// back to the default; large values are capped.
pub fn history_limit(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|&n| n > 0)
        .map(|n| n.min(MAX_HISTORY_LIMIT))
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
}

/// Pull the `url` string out of a JSON body, rejecting anything else.
fn request_url(body: Result<Json<Value>, JsonRejection>) -> Result<String, ApiError> {
    let Ok(Json(value)) = body else {
        return Err(ApiError::missing_url());
    };
    value
        .get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_owned)
        .ok_or_else(ApiError::missing_url)
}

// ---------------------------------------------------------------------------
// Scrape
// ---------------------------------------------------------------------------

/// `POST /api/scrape`
pub async fn scrape(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ExtractionRecord> {
    let url = request_url(body)?;
    let record = state.services.scrape.run(&url, &SilentProgress).await?;
    Ok(Json(record))
}

/// `GET /api/history`
pub async fn scrape_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<ExtractionRecord>> {
    let limit = history_limit(query.limit.as_deref());
    Ok(Json(state.services.storage.list_extractions(limit).await?))
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// `POST /api/analyze`
pub async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<CritiqueResult> {
    let url = request_url(body)?;
    let result = state.services.analysis.run(&url, &SilentProgress).await?;
    Ok(Json(result))
}

/// `GET /api/analyses`
pub async fn analysis_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<CritiqueResult>> {
    let limit = history_limit(query.limit.as_deref());
    Ok(Json(state.services.storage.list_critiques(limit).await?))
}

// ---------------------------------------------------------------------------
// Repurpose
// ---------------------------------------------------------------------------

/// `POST /api/repurpose`
pub async fn repurpose(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<RepurposeResult> {
    let url = request_url(body)?;
    let result = state.services.repurpose.run(&url, &SilentProgress).await?;
    Ok(Json(result))
}

/// `GET /api/repurpose/history`
pub async fn repurpose_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<RepurposeResult>> {
    let limit = history_limit(query.limit.as_deref());
    Ok(Json(state.services.storage.list_repurposes(limit).await?))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
