//! Simulated crime statistics.

use super::{Sampler, SimulatedLatency, Source};
use crate::models::{CrimeData, CrimeLevel, SourceKind, SourceRecord};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const ABSENT_BELOW: f64 = 0.20;

pub struct CrimeStatsSource {
    sampler: Arc<dyn Sampler>,
    latency: SimulatedLatency,
}

impl CrimeStatsSource {
    pub const DEFAULT_LATENCY: SimulatedLatency = SimulatedLatency {
        base_ms: 250,
        jitter_ms: 250,
    };

    pub fn new(sampler: Arc<dyn Sampler>, latency: SimulatedLatency) -> Self {
        Self { sampler, latency }
    }
}

pub fn synthesize(r: f64) -> Option<SourceRecord<CrimeData>> {
    if r < ABSENT_BELOW {
        return None;
    }

    let crime_rate = r * 100.0;
    let data = CrimeData {
        crime_rate,
        crime_level: CrimeLevel::from_rate(crime_rate),
    };

    Some(SourceRecord::new(data, 0.5 + r * 0.4))
}

#[async_trait]
impl Source for CrimeStatsSource {
    type Output = CrimeData;

    fn kind(&self) -> SourceKind {
        SourceKind::CrimeStatistics
    }

    async fn fetch(&self, address: &str) -> Option<SourceRecord<CrimeData>> {
        self.latency.wait().await;

        let record = synthesize(self.sampler.sample(address));
        if record.is_none() {
            debug!(source = %self.kind(), "No crime statistics for address");
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold() {
        assert!(synthesize(0.19).is_none());
        assert!(synthesize(0.20).is_some());
    }

    #[test]
    fn test_levels_follow_rate() {
        assert_eq!(synthesize(0.21).unwrap().data.crime_level, CrimeLevel::VeryLow);
        assert_eq!(synthesize(0.34).unwrap().data.crime_level, CrimeLevel::Low);
        assert_eq!(synthesize(0.62).unwrap().data.crime_level, CrimeLevel::Moderate);
        assert_eq!(synthesize(0.86).unwrap().data.crime_level, CrimeLevel::High);
    }

    #[test]
    fn test_confidence_range() {
        let record = synthesize(0.34).unwrap();
        assert!((record.confidence - 0.636).abs() < 1e-9);
        assert!((record.data.crime_rate - 34.0).abs() < 1e-9);
    }
}
