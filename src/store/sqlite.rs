//! SQLite-backed snapshot store.

use super::{schema, Snapshot, SnapshotStore, StoreError, StoreResult};
use crate::models::{AggregatedRecord, ParsedAddress};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Snapshot store over a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and ensure the schema.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        debug!("Connecting to database: {}", url);

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        schema::init_tables(&pool).await?;
        info!("Database ready at {}", url);

        Ok(Self { pool })
    }

    /// Private in-memory database. A single long-lived connection keeps the
    /// data alive for the lifetime of the store.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        schema::init_tables(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn now_text() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_i64(value: Option<u32>) -> Option<i64> {
    value.map(i64::from)
}

fn snapshot_from_row(row: &SqliteRow) -> StoreResult<Snapshot> {
    let created_at: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| StoreError::Corrupt(format!("created_at '{}': {}", created_at, e)))?
        .with_timezone(&Utc);

    Ok(Snapshot {
        id: row.try_get("id")?,
        property_id: row.try_get("property_id")?,
        bedrooms: row.try_get("bedrooms")?,
        bathrooms: row.try_get("bathrooms")?,
        square_feet: row.try_get("square_feet")?,
        year_built: row.try_get("year_built")?,
        property_type: row.try_get("property_type")?,
        estimated_value: row.try_get("estimated_value")?,
        elementary_school: row.try_get("elementary_school")?,
        elementary_rating: row.try_get("elementary_rating")?,
        middle_school: row.try_get("middle_school")?,
        middle_rating: row.try_get("middle_rating")?,
        high_school: row.try_get("high_school")?,
        high_rating: row.try_get("high_rating")?,
        crime_rate: row.try_get("crime_rate")?,
        crime_level: row.try_get("crime_level")?,
        nearby_parks: row.try_get("nearby_parks")?,
        transit_score: row.try_get("transit_score")?,
        walk_score: row.try_get("walk_score")?,
        data_confidence: row.try_get("data_confidence")?,
        created_at,
    })
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    async fn upsert_property(&self, address: &ParsedAddress) -> StoreResult<String> {
        let now = now_text();

        sqlx::query(
            r#"
            INSERT INTO properties (id, address, city, state, zip_code, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(address) DO UPDATE SET
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&address.address)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        // Re-read the id: on conflict the existing row keeps its original id
        let row = sqlx::query("SELECT id FROM properties WHERE address = ?")
            .bind(&address.address)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("id")?)
    }

    async fn insert_snapshot(
        &self,
        property_id: &str,
        record: &AggregatedRecord,
    ) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        let basic = &record.basic_info;
        let schools = &record.schools;
        let crime = &record.crime;
        let amenities = &record.amenities;

        let estimated_value = basic
            .estimated_value
            .map(|v| {
                i64::try_from(v)
                    .map_err(|_| StoreError::OutOfRange(format!("estimated_value {}", v)))
            })
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO property_snapshots (
                id, property_id,
                bedrooms, bathrooms, square_feet, year_built, property_type, estimated_value,
                elementary_school, elementary_rating, middle_school, middle_rating,
                high_school, high_rating,
                crime_rate, crime_level,
                nearby_parks, transit_score, walk_score,
                data_confidence, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(property_id)
        .bind(to_i64(basic.bedrooms))
        .bind(to_i64(basic.bathrooms))
        .bind(to_i64(basic.square_feet))
        .bind(to_i64(basic.year_built))
        .bind(&basic.property_type)
        .bind(estimated_value)
        .bind(&schools.elementary_school)
        .bind(schools.elementary_rating)
        .bind(&schools.middle_school)
        .bind(schools.middle_rating)
        .bind(&schools.high_school)
        .bind(schools.high_rating)
        .bind(crime.crime_rate)
        .bind(crime.crime_level.map(|level| level.as_str()))
        .bind(to_i64(amenities.nearby_parks))
        .bind(to_i64(amenities.transit_score))
        .bind(to_i64(amenities.walk_score))
        .bind(record.data_quality.overall_confidence)
        .bind(now_text())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn snapshots_for(&self, address: &str, limit: u32) -> StoreResult<Vec<Snapshot>> {
        let rows = sqlx::query(
            r#"
            SELECT s.*
            FROM property_snapshots s
            JOIN properties p ON p.id = s.property_id
            WHERE p.address = ?
            ORDER BY s.created_at DESC, s.rowid DESC
            LIMIT ?
            "#,
        )
        .bind(address)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(snapshot_from_row).collect()
    }
}
