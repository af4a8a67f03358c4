//! Simulated school ratings.

use super::{Sampler, SimulatedLatency, Source};
use crate::models::{SchoolData, SourceKind, SourceRecord};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const ABSENT_BELOW: f64 = 0.15;

pub struct SchoolRatingsSource {
    sampler: Arc<dyn Sampler>,
    latency: SimulatedLatency,
}

impl SchoolRatingsSource {
    pub const DEFAULT_LATENCY: SimulatedLatency = SimulatedLatency {
        base_ms: 400,
        jitter_ms: 300,
    };

    pub fn new(sampler: Arc<dyn Sampler>, latency: SimulatedLatency) -> Self {
        Self { sampler, latency }
    }
}

/// School names are derived from the text before the first space.
pub fn synthesize(address: &str, r: f64) -> Option<SourceRecord<SchoolData>> {
    if r < ABSENT_BELOW {
        return None;
    }

    let prefix = address.split(' ').next().unwrap_or_default();

    let data = SchoolData {
        elementary_school: format!("{} Elementary", prefix),
        elementary_rating: 5.0 + r * 5.0,
        middle_school: format!("{} Middle School", prefix),
        middle_rating: 4.0 + r * 6.0,
        high_school: format!("{} High School", prefix),
        high_rating: 6.0 + r * 4.0,
    };

    Some(SourceRecord::new(data, 0.6 + r * 0.3))
}

#[async_trait]
impl Source for SchoolRatingsSource {
    type Output = SchoolData;

    fn kind(&self) -> SourceKind {
        SourceKind::SchoolRatings
    }

    async fn fetch(&self, address: &str) -> Option<SourceRecord<SchoolData>> {
        self.latency.wait().await;

        let record = synthesize(address, self.sampler.sample(address));
        if record.is_none() {
            debug!(source = %self.kind(), "No school ratings for address");
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold() {
        assert!(synthesize("1 A St", 0.14).is_none());
        assert!(synthesize("1 A St", 0.15).is_some());
    }

    #[test]
    fn test_names_use_first_word() {
        let record = synthesize("123 Main St, Springfield, IL 62701", 0.34).unwrap();
        assert_eq!(record.data.elementary_school, "123 Elementary");
        assert_eq!(record.data.middle_school, "123 Middle School");
        assert_eq!(record.data.high_school, "123 High School");
    }

    #[test]
    fn test_ratings_and_confidence() {
        let record = synthesize("x", 0.62).unwrap();
        assert!((record.data.elementary_rating - 8.1).abs() < 1e-9);
        assert!((record.data.middle_rating - 7.72).abs() < 1e-9);
        assert!((record.data.high_rating - 8.48).abs() < 1e-9);
        assert!((record.confidence - 0.786).abs() < 1e-9);
    }

    #[test]
    fn test_leading_space_gives_empty_prefix() {
        let record = synthesize(" Elm", 0.5).unwrap();
        assert_eq!(record.data.elementary_school, " Elementary");
    }
}
