//! Table definitions, created on startup.

use sqlx::SqlitePool;

use super::StoreResult;

/// Create the `properties` and `property_snapshots` tables if missing.
pub async fn init_tables(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS properties (
            id TEXT PRIMARY KEY,
            address TEXT NOT NULL UNIQUE,
            city TEXT NOT NULL,
            state TEXT NOT NULL,
            zip_code TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS property_snapshots (
            id TEXT PRIMARY KEY,
            property_id TEXT NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
            bedrooms INTEGER,
            bathrooms INTEGER,
            square_feet INTEGER,
            year_built INTEGER,
            property_type TEXT,
            estimated_value INTEGER,
            elementary_school TEXT,
            elementary_rating REAL,
            middle_school TEXT,
            middle_rating REAL,
            high_school TEXT,
            high_rating REAL,
            crime_rate REAL,
            crime_level TEXT,
            nearby_parks INTEGER,
            transit_score INTEGER,
            walk_score INTEGER,
            data_confidence REAL NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_snapshots_property ON property_snapshots(property_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
