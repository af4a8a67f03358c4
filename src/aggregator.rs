//! Property data aggregation.
//!
//! Fans a lookup out to every source concurrently, merges whatever came
//! back into one [`AggregatedRecord`] and scores its data quality. Missing
//! sources are data, not errors: they count as zero confidence and are
//! listed by name.

use crate::address::parse_address;
use crate::models::{
    AggregatedRecord, AmenitiesData, BasicInfo, CrimeData, DataQuality, ParsedAddress, SchoolData,
    SourceKind, SourceRecord,
};
use crate::sources::SourceSet;
use crate::store::{SnapshotStore, StoreResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Combines the four sources into one record and optionally persists it.
#[derive(Clone)]
pub struct Aggregator {
    sources: SourceSet,
    store: Option<Arc<dyn SnapshotStore>>,
}

impl Aggregator {
    pub fn new(sources: SourceSet, store: Option<Arc<dyn SnapshotStore>>) -> Self {
        Self { sources, store }
    }

    /// The configured snapshot store, if any.
    pub fn store(&self) -> Option<&Arc<dyn SnapshotStore>> {
        self.store.as_ref()
    }

    /// Look up `full_address` in every source and merge the results.
    ///
    /// Never fails. Persistence errors are logged and the in-memory record is
    /// still returned.
    pub async fn aggregate(&self, full_address: &str) -> AggregatedRecord {
        let property = parse_address(full_address);
        debug!(address = %property.address, "Fetching from all sources");

        let (basic_info, schools, crime, amenities) = futures::join!(
            self.sources.property_records.fetch(full_address),
            self.sources.school_ratings.fetch(full_address),
            self.sources.crime_stats.fetch(full_address),
            self.sources.amenities.fetch(full_address),
        );

        let record = merge(property, basic_info, schools, crime, amenities, Utc::now());

        info!(
            address = %record.property.address,
            confidence = record.data_quality.overall_confidence,
            missing = record.data_quality.missing_data_sources.len(),
            "Aggregated property data"
        );

        if let Some(store) = &self.store {
            match persist(store.as_ref(), &record).await {
                Ok(snapshot_id) => debug!(snapshot_id = %snapshot_id, "Snapshot saved"),
                Err(e) => error!(
                    address = %record.property.address,
                    error = %e,
                    "Error saving property snapshot"
                ),
            }
        }

        record
    }
}

/// Upsert the property, then append a snapshot of `record`.
async fn persist(store: &dyn SnapshotStore, record: &AggregatedRecord) -> StoreResult<String> {
    let property_id = store.upsert_property(&record.property).await?;
    store.insert_snapshot(&property_id, record).await
}

/// Mean confidence over all sources; an absent source contributes zero.
pub fn overall_confidence(confidences: &[Option<f64>; 4]) -> f64 {
    confidences.iter().flatten().sum::<f64>() / SourceKind::ALL.len() as f64
}

/// Names of absent sources, in canonical order.
pub fn missing_sources(confidences: &[Option<f64>; 4]) -> Vec<String> {
    SourceKind::ALL
        .iter()
        .zip(confidences)
        .filter(|(_, confidence)| confidence.is_none())
        .map(|(kind, _)| kind.display_name().to_string())
        .collect()
}

/// Build the data-quality block from per-source confidences, given in
/// canonical source order.
pub fn assess_quality(confidences: [Option<f64>; 4]) -> DataQuality {
    let [basic_info, schools, crime, amenities] = confidences;

    DataQuality {
        overall_confidence: overall_confidence(&confidences),
        basic_info_confidence: basic_info,
        schools_confidence: schools,
        crime_confidence: crime,
        amenities_confidence: amenities,
        missing_data_sources: missing_sources(&confidences),
    }
}

/// Merge per-source results into one record.
pub fn merge(
    property: ParsedAddress,
    basic_info: Option<SourceRecord<BasicInfo>>,
    schools: Option<SourceRecord<SchoolData>>,
    crime: Option<SourceRecord<CrimeData>>,
    amenities: Option<SourceRecord<AmenitiesData>>,
    timestamp: DateTime<Utc>,
) -> AggregatedRecord {
    let data_quality = assess_quality([
        basic_info.as_ref().map(|r| r.confidence),
        schools.as_ref().map(|r| r.confidence),
        crime.as_ref().map(|r| r.confidence),
        amenities.as_ref().map(|r| r.confidence),
    ]);

    AggregatedRecord {
        property,
        basic_info: basic_info.map(|r| r.data).into(),
        schools: schools.map(|r| r.data).into(),
        crime: crime.map(|r| r.data).into(),
        amenities: amenities.map(|r| r.data).into(),
        data_quality,
        last_updated: timestamp,
    }
}
