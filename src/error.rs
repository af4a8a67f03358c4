//! HTTP error mapping.
//!
//! Client mistakes are answered with their message; anything else is logged
//! in full and answered with a generic message so internals never leak.

use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Feature not available in this deployment (503)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Snapshot store failure (500)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Anything unexpected (500)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Store(ref err) => {
                error!(error = %err, "Error loading property history");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to load property history".to_string(),
                )
            }
            ApiError::Other(ref err) => {
                error!(error = %err, "Error fetching property data");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch property data".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
