//! Property data sources.
//!
//! Every data category is served by an independent [`Source`]. A source
//! never fails: when it has nothing for an address it returns `None`, and
//! the aggregator records it as missing.
//!
//! The bundled implementations are simulated. Each one derives a value in
//! [0, 1) from the address through a [`Sampler`] and synthesizes plausible
//! data from it, after an artificial network delay.

pub mod amenities;
pub mod crime_stats;
pub mod property_records;
pub mod school_ratings;

pub use amenities::AmenitiesSource;
pub use crime_stats::CrimeStatsSource;
pub use property_records::PropertyRecordsSource;
pub use school_ratings::SchoolRatingsSource;

use crate::models::{AmenitiesData, BasicInfo, CrimeData, SchoolData, SourceKind, SourceRecord};
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// A single data category provider.
#[async_trait]
pub trait Source: Send + Sync {
    /// Payload type produced by this source.
    type Output: Send;

    /// Which category this source serves.
    fn kind(&self) -> SourceKind;

    /// Look up `address`. `None` means the source has no data for it.
    async fn fetch(&self, address: &str) -> Option<SourceRecord<Self::Output>>;
}

/// Maps an address to a pseudo-random value in [0, 1).
pub trait Sampler: Send + Sync {
    fn sample(&self, address: &str) -> f64;
}

/// Default sampler: sum of UTF-16 code units, modulo 100, divided by 100.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressHash;

impl Sampler for AddressHash {
    fn sample(&self, address: &str) -> f64 {
        let hash: u64 = address.encode_utf16().map(u64::from).sum();
        (hash % 100) as f64 / 100.0
    }
}

/// Sampler returning the same value for every address.
#[derive(Debug, Clone, Copy)]
pub struct FixedSample(pub f64);

impl Sampler for FixedSample {
    fn sample(&self, _address: &str) -> f64 {
        self.0
    }
}

/// Artificial delay applied before a simulated source answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedLatency {
    pub base_ms: u64,
    pub jitter_ms: u64,
}

impl SimulatedLatency {
    pub const NONE: SimulatedLatency = SimulatedLatency {
        base_ms: 0,
        jitter_ms: 0,
    };

    pub fn new(base_ms: u64, jitter_ms: u64) -> Self {
        Self { base_ms, jitter_ms }
    }

    /// Sleep for `base + uniform(0, jitter)` milliseconds.
    pub async fn wait(&self) {
        if self.base_ms == 0 && self.jitter_ms == 0 {
            return;
        }

        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..self.jitter_ms)
        } else {
            0
        };

        tokio::time::sleep(Duration::from_millis(self.base_ms + jitter)).await;
    }
}

/// The four sources consulted for every lookup.
#[derive(Clone)]
pub struct SourceSet {
    pub property_records: Arc<dyn Source<Output = BasicInfo>>,
    pub school_ratings: Arc<dyn Source<Output = SchoolData>>,
    pub crime_stats: Arc<dyn Source<Output = CrimeData>>,
    pub amenities: Arc<dyn Source<Output = AmenitiesData>>,
}

impl SourceSet {
    /// Simulated sources keyed by the address hash.
    pub fn simulated(simulate_latency: bool) -> Self {
        Self::simulated_with(Arc::new(AddressHash), simulate_latency)
    }

    /// Simulated sources sharing one sampler.
    pub fn simulated_with(sampler: Arc<dyn Sampler>, simulate_latency: bool) -> Self {
        let pick = |latency: SimulatedLatency| {
            if simulate_latency {
                latency
            } else {
                SimulatedLatency::NONE
            }
        };

        Self {
            property_records: Arc::new(PropertyRecordsSource::new(
                Arc::clone(&sampler),
                pick(PropertyRecordsSource::DEFAULT_LATENCY),
            )),
            school_ratings: Arc::new(SchoolRatingsSource::new(
                Arc::clone(&sampler),
                pick(SchoolRatingsSource::DEFAULT_LATENCY),
            )),
            crime_stats: Arc::new(CrimeStatsSource::new(
                Arc::clone(&sampler),
                pick(CrimeStatsSource::DEFAULT_LATENCY),
            )),
            amenities: Arc::new(AmenitiesSource::new(
                sampler,
                pick(AmenitiesSource::DEFAULT_LATENCY),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hash_known_values() {
        // 'A' = 65, 'Yew' = 89 + 101 + 119 = 309
        assert_eq!(AddressHash.sample("A"), 0.65);
        assert_eq!(AddressHash.sample("Yew"), 0.09);
        assert_eq!(AddressHash.sample("123 Main St, Springfield, IL 62701"), 0.34);
    }

    #[test]
    fn test_address_hash_empty_is_zero() {
        assert_eq!(AddressHash.sample(""), 0.0);
    }

    #[test]
    fn test_address_hash_counts_utf16_units() {
        // U+1F3E0 is a surrogate pair: 0xD83C + 0xDFE0 = 112668
        assert_eq!(AddressHash.sample("\u{1F3E0}"), 0.68);
    }

    #[test]
    fn test_address_hash_in_unit_range() {
        for addr in ["", "x", "10 Downing St", "221B Baker St, London, UK NW16XE"] {
            let r = AddressHash.sample(addr);
            assert!((0.0..1.0).contains(&r));
        }
    }

    #[tokio::test]
    async fn test_zero_latency_returns_immediately() {
        let start = std::time::Instant::now();
        SimulatedLatency::NONE.wait().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
