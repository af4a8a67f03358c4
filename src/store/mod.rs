//! Snapshot persistence.
//!
//! A property is identified by its parsed street address. Every lookup
//! upserts the property row and appends an immutable snapshot carrying the
//! merged fields and the overall confidence, so the history of an address
//! can be replayed later.

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::models::{AggregatedRecord, ParsedAddress};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored row could not be decoded
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// Value does not fit its column
    #[error("Value out of range: {0}")]
    OutOfRange(String),
}

/// One stored snapshot, newest data first when listed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub property_id: String,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub square_feet: Option<i64>,
    pub year_built: Option<i64>,
    pub property_type: Option<String>,
    pub estimated_value: Option<i64>,
    pub elementary_school: Option<String>,
    pub elementary_rating: Option<f64>,
    pub middle_school: Option<String>,
    pub middle_rating: Option<f64>,
    pub high_school: Option<String>,
    pub high_rating: Option<f64>,
    pub crime_rate: Option<f64>,
    pub crime_level: Option<String>,
    pub nearby_parks: Option<i64>,
    pub transit_score: Option<i64>,
    pub walk_score: Option<i64>,
    pub data_confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Write and read contract for property snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Create the property if unseen, otherwise touch `updated_at`.
    /// Returns the property id.
    async fn upsert_property(&self, address: &ParsedAddress) -> StoreResult<String>;

    /// Append a snapshot of `record` for `property_id`. Returns the snapshot id.
    async fn insert_snapshot(
        &self,
        property_id: &str,
        record: &AggregatedRecord,
    ) -> StoreResult<String>;

    /// Most recent snapshots for a street address, newest first.
    async fn snapshots_for(&self, address: &str, limit: u32) -> StoreResult<Vec<Snapshot>>;
}
