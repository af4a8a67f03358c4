//! Simulated amenities and walkability data.

use super::{Sampler, SimulatedLatency, Source};
use crate::models::{AmenitiesData, SourceKind, SourceRecord};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const ABSENT_BELOW: f64 = 0.12;

pub struct AmenitiesSource {
    sampler: Arc<dyn Sampler>,
    latency: SimulatedLatency,
}

impl AmenitiesSource {
    pub const DEFAULT_LATENCY: SimulatedLatency = SimulatedLatency {
        base_ms: 350,
        jitter_ms: 200,
    };

    pub fn new(sampler: Arc<dyn Sampler>, latency: SimulatedLatency) -> Self {
        Self { sampler, latency }
    }
}

pub fn synthesize(r: f64) -> Option<SourceRecord<AmenitiesData>> {
    if r < ABSENT_BELOW {
        return None;
    }

    let data = AmenitiesData {
        nearby_parks: (r * 10.0).floor() as u32,
        transit_score: (20.0 + r * 80.0).floor() as u32,
        walk_score: (10.0 + r * 90.0).floor() as u32,
    };

    Some(SourceRecord::new(data, 0.65 + r * 0.35))
}

#[async_trait]
impl Source for AmenitiesSource {
    type Output = AmenitiesData;

    fn kind(&self) -> SourceKind {
        SourceKind::AmenitiesData
    }

    async fn fetch(&self, address: &str) -> Option<SourceRecord<AmenitiesData>> {
        self.latency.wait().await;

        let record = synthesize(self.sampler.sample(address));
        if record.is_none() {
            debug!(source = %self.kind(), "No amenities data for address");
        }
        record
    }
}
