//! HTTP API handlers.

pub mod health;
pub mod property;

pub use health::health_routes;
pub use property::property_routes;

use crate::aggregator::Aggregator;
use crate::summary::SummaryGenerator;
use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
    pub summarizer: SummaryGenerator,
    /// Attach `aiSummary` unless the request opts out
    pub include_summary: bool,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(aggregator: Aggregator, summarizer: SummaryGenerator, include_summary: bool) -> Self {
        Self {
            aggregator,
            summarizer,
            include_summary,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(property_routes())
        .merge(health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
