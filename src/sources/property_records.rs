//! Simulated public property records.

use super::{Sampler, SimulatedLatency, Source};
use crate::models::{BasicInfo, SourceKind, SourceRecord};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Below this sample value the records office has nothing on file.
const ABSENT_BELOW: f64 = 0.10;

const PROPERTY_TYPES: [&str; 4] = ["Single Family", "Condo", "Townhouse", "Multi-Family"];

/// Bedrooms, bathrooms, size, age, type and estimated value.
pub struct PropertyRecordsSource {
    sampler: Arc<dyn Sampler>,
    latency: SimulatedLatency,
}

impl PropertyRecordsSource {
    pub const DEFAULT_LATENCY: SimulatedLatency = SimulatedLatency {
        base_ms: 300,
        jitter_ms: 200,
    };

    pub fn new(sampler: Arc<dyn Sampler>, latency: SimulatedLatency) -> Self {
        Self { sampler, latency }
    }
}

/// Build the record for sample value `r`, or `None` when below threshold.
pub fn synthesize(r: f64) -> Option<SourceRecord<BasicInfo>> {
    if r < ABSENT_BELOW {
        return None;
    }

    let type_index = ((r * 4.0).floor() as usize).min(PROPERTY_TYPES.len() - 1);

    let info = BasicInfo {
        bedrooms: 2 + (r * 5.0).floor() as u32,
        bathrooms: 1 + (r * 3.5).floor() as u32,
        square_feet: 1000 + (r * 3000.0).floor() as u32,
        year_built: 1950 + (r * 74.0).floor() as u32,
        property_type: PROPERTY_TYPES[type_index].to_string(),
        estimated_value: 200_000 + (r * 800_000.0).floor() as u64,
    };

    Some(SourceRecord::new(info, 0.7 + r * 0.3))
}

#[async_trait]
impl Source for PropertyRecordsSource {
    type Output = BasicInfo;

    fn kind(&self) -> SourceKind {
        SourceKind::PropertyRecords
    }

    async fn fetch(&self, address: &str) -> Option<SourceRecord<BasicInfo>> {
        self.latency.wait().await;

        let record = synthesize(self.sampler.sample(address));
        if record.is_none() {
            debug!(source = %self.kind(), "No property records for address");
        }
        record
    }
}
