//! Data models for the property aggregator.
//!
//! This module contains the per-source payloads, the merged property record
//! and the HTTP response shape. Serialized field names follow the camelCase
//! wire format consumed by the web front end; unset optional fields are
//! omitted from the JSON output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four independent data categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Public property records (bedrooms, size, value, ...)
    PropertyRecords,
    /// Nearby school ratings
    SchoolRatings,
    /// Neighbourhood crime statistics
    CrimeStatistics,
    /// Parks, transit and walkability
    AmenitiesData,
}

impl SourceKind {
    /// All sources in canonical reporting order.
    pub const ALL: [SourceKind; 4] = [
        SourceKind::PropertyRecords,
        SourceKind::SchoolRatings,
        SourceKind::CrimeStatistics,
        SourceKind::AmenitiesData,
    ];

    /// Human-readable name used in `missingDataSources`.
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::PropertyRecords => "Property Records",
            SourceKind::SchoolRatings => "School Ratings",
            SourceKind::CrimeStatistics => "Crime Statistics",
            SourceKind::AmenitiesData => "Amenities Data",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A payload reported by a single source together with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord<T> {
    /// The data reported by the source.
    pub data: T,
    /// Source-reported reliability in [0, 1].
    pub confidence: f64,
}

impl<T> SourceRecord<T> {
    pub fn new(data: T, confidence: f64) -> Self {
        Self { data, confidence }
    }
}

/// Structured form of a free-text address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAddress {
    /// Street portion; also the identity key for persistence.
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

/// Basic property facts from public records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub square_feet: u32,
    pub year_built: u32,
    pub property_type: String,
    pub estimated_value: u64,
}

/// Assigned schools and their ratings (0-10).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolData {
    pub elementary_school: String,
    pub elementary_rating: f64,
    pub middle_school: String,
    pub middle_rating: f64,
    pub high_school: String,
    pub high_rating: f64,
}

/// Banded crime level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrimeLevel {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Moderate,
    High,
}

impl CrimeLevel {
    /// Band a crime rate (incidents per 100k).
    pub fn from_rate(rate: f64) -> Self {
        if rate < 25.0 {
            CrimeLevel::VeryLow
        } else if rate < 50.0 {
            CrimeLevel::Low
        } else if rate < 75.0 {
            CrimeLevel::Moderate
        } else {
            CrimeLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CrimeLevel::VeryLow => "Very Low",
            CrimeLevel::Low => "Low",
            CrimeLevel::Moderate => "Moderate",
            CrimeLevel::High => "High",
        }
    }
}

impl fmt::Display for CrimeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Crime statistics for the surrounding area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeData {
    /// Incidents per 100k residents.
    pub crime_rate: f64,
    pub crime_level: CrimeLevel,
}

/// Nearby amenities and mobility scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmenitiesData {
    pub nearby_parks: u32,
    /// 0-100
    pub transit_score: u32,
    /// 0-100
    pub walk_score: u32,
}

/// Basic info as it appears in the merged record; every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfoSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub square_feet: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<u64>,
}

impl From<Option<BasicInfo>> for BasicInfoSection {
    fn from(info: Option<BasicInfo>) -> Self {
        match info {
            Some(info) => Self {
                bedrooms: Some(info.bedrooms),
                bathrooms: Some(info.bathrooms),
                square_feet: Some(info.square_feet),
                year_built: Some(info.year_built),
                property_type: Some(info.property_type),
                estimated_value: Some(info.estimated_value),
            },
            None => Self::default(),
        }
    }
}

/// School data as it appears in the merged record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elementary_school: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elementary_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_school: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_school: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_rating: Option<f64>,
}

impl SchoolsSection {
    /// Mean of the ratings that are present.
    pub fn average_rating(&self) -> Option<f64> {
        let ratings: Vec<f64> = [self.elementary_rating, self.middle_rating, self.high_rating]
            .into_iter()
            .flatten()
            .collect();

        if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        }
    }
}

impl From<Option<SchoolData>> for SchoolsSection {
    fn from(data: Option<SchoolData>) -> Self {
        match data {
            Some(data) => Self {
                elementary_school: Some(data.elementary_school),
                elementary_rating: Some(data.elementary_rating),
                middle_school: Some(data.middle_school),
                middle_rating: Some(data.middle_rating),
                high_school: Some(data.high_school),
                high_rating: Some(data.high_rating),
            },
            None => Self::default(),
        }
    }
}

/// Crime data as it appears in the merged record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crime_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crime_level: Option<CrimeLevel>,
}

impl From<Option<CrimeData>> for CrimeSection {
    fn from(data: Option<CrimeData>) -> Self {
        match data {
            Some(data) => Self {
                crime_rate: Some(data.crime_rate),
                crime_level: Some(data.crime_level),
            },
            None => Self::default(),
        }
    }
}

/// Amenities as they appear in the merged record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmenitiesSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearby_parks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transit_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub walk_score: Option<u32>,
}

impl From<Option<AmenitiesData>> for AmenitiesSection {
    fn from(data: Option<AmenitiesData>) -> Self {
        match data {
            Some(data) => Self {
                nearby_parks: Some(data.nearby_parks),
                transit_score: Some(data.transit_score),
                walk_score: Some(data.walk_score),
            },
            None => Self::default(),
        }
    }
}

/// Quality metrics for a merged record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    /// Sum of present source confidences divided by the number of sources.
    pub overall_confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_info_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schools_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crime_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenities_confidence: Option<f64>,
    /// Names of sources that returned no data, in canonical order.
    pub missing_data_sources: Vec<String>,
}

impl DataQuality {
    /// Overall confidence as a rounded percentage.
    pub fn overall_percent(&self) -> i64 {
        (self.overall_confidence * 100.0).round() as i64
    }
}

/// The merged view of one address across all sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRecord {
    pub property: ParsedAddress,
    pub basic_info: BasicInfoSection,
    pub schools: SchoolsSection,
    pub crime: CrimeSection,
    pub amenities: AmenitiesSection,
    pub data_quality: DataQuality,
    pub last_updated: DateTime<Utc>,
}

/// Body of `GET /api/property`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResponse {
    #[serde(flatten)]
    pub record: AggregatedRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
}
