//! Property lookup and snapshot history endpoints.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::PropertyResponse;
use crate::store::Snapshot;

const DEFAULT_HISTORY_LIMIT: u32 = 20;
const MAX_HISTORY_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct PropertyQuery {
    pub address: Option<String>,
    /// Set to `false` to skip the summary step
    pub summary: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub address: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub address: String,
    pub snapshots: Vec<Snapshot>,
}

/// The `address` parameter exactly as sent. Sources key on the raw text,
/// so only the blank check looks at a trimmed view.
fn required_address(address: Option<String>) -> ApiResult<String> {
    address
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Address parameter is required".to_string()))
}

/// Malformed parameters answer with the same JSON error body as the rest.
fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// GET /api/property?address=...
///
/// Aggregates all sources for the address and, unless disabled, attaches a
/// summary. Runs on its own task so a panic surfaces as a 500.
pub async fn get_property(
    State(state): State<AppState>,
    query: Result<Query<PropertyQuery>, QueryRejection>,
) -> ApiResult<Json<PropertyResponse>> {
    let query = query_params(query)?;
    let address = required_address(query.address)?;
    let with_summary = query.summary.unwrap_or(state.include_summary);

    info!(address = %address, with_summary, "Property lookup");

    let response = tokio::spawn(async move {
        let record = state.aggregator.aggregate(&address).await;
        let ai_summary = if with_summary {
            Some(state.summarizer.summarize(&record).await)
        } else {
            None
        };
        PropertyResponse { record, ai_summary }
    })
    .await
    .map_err(|e| anyhow::anyhow!("Property lookup task failed: {}", e))?;

    Ok(Json(response))
}

/// GET /api/property/history?address=...&limit=...
///
/// `address` is the street part used as the property identity.
pub async fn get_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Json<HistoryResponse>> {
    let query = query_params(query)?;
    // Stored street addresses are already trimmed
    let address = required_address(query.address)?.trim().to_string();
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let store = state
        .aggregator
        .store()
        .ok_or_else(|| ApiError::Unavailable("Snapshot history is unavailable".to_string()))?;

    let snapshots = store.snapshots_for(&address, limit).await?;

    Ok(Json(HistoryResponse { address, snapshots }))
}

/// Build property routes
pub fn property_routes() -> Router<AppState> {
    Router::new()
        .route("/api/property", get(get_property))
        .route("/api/property/history", get(get_history))
}
