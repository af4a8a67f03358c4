//! Natural-language property summaries.
//!
//! The generator formats the aggregated record as a plain-text context and
//! asks a chat model to write a short buyer-facing summary. Whenever that is
//! not possible (no model configured, request failure, empty answer) a
//! rule-based summary is written locally instead, so callers always get text.

pub mod client;

pub use client::{ChatClient, ChatConfig, TextGenerator};

use crate::models::{AggregatedRecord, CrimeLevel};
use crate::report::{format_thousands, or_na};
use std::sync::Arc;
use tracing::{debug, warn};

/// First line of every locally generated summary.
pub const FALLBACK_MARKER: &str =
    "[Automated summary: AI analysis is currently unavailable, this overview was generated from the raw data.]";

/// Crime confidence below which the safety note is flagged as uncertain.
const LOW_CONFIDENCE: f64 = 0.7;

/// Writes summaries, preferring the configured text generator.
#[derive(Clone)]
pub struct SummaryGenerator {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl SummaryGenerator {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// A generator that always uses the local fallback.
    pub fn fallback_only() -> Self {
        Self { generator: None }
    }

    /// Summarize `record`. Never fails and never returns empty text.
    pub async fn summarize(&self, record: &AggregatedRecord) -> String {
        let Some(generator) = &self.generator else {
            debug!("No text generator configured, using fallback summary");
            return fallback_summary(record);
        };

        let context = build_context(record);

        match generator.complete(SYSTEM_PROMPT, &context).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("Text generation returned an empty summary, using fallback");
                fallback_summary(record)
            }
            Err(e) => {
                warn!(error = %e, "Error generating AI summary, using fallback");
                fallback_summary(record)
            }
        }
    }
}

/// Format every field of the record as the model's user message.
pub fn build_context(record: &AggregatedRecord) -> String {
    let property = &record.property;
    let basic = &record.basic_info;
    let schools = &record.schools;
    let crime = &record.crime;
    let amenities = &record.amenities;
    let quality = &record.data_quality;

    let rating = |r: Option<f64>| or_na(r.map(|r| format!("{:.1}", r)));
    let missing = if quality.missing_data_sources.is_empty() {
        "None".to_string()
    } else {
        quality.missing_data_sources.join(", ")
    };

    let mut context = String::new();

    context.push_str(&format!(
        "Property Address: {}, {}, {} {}\n\n",
        property.address, property.city, property.state, property.zip_code
    ));

    context.push_str("PROPERTY DETAILS:\n");
    context.push_str(&format!(
        "- Type: {}\n",
        basic.property_type.as_deref().unwrap_or("Unknown")
    ));
    context.push_str(&format!("- Bedrooms: {}\n", or_na(basic.bedrooms)));
    context.push_str(&format!("- Bathrooms: {}\n", or_na(basic.bathrooms)));
    context.push_str(&format!(
        "- Square Feet: {}\n",
        or_na(basic.square_feet.map(|v| format_thousands(u64::from(v))))
    ));
    context.push_str(&format!("- Year Built: {}\n", or_na(basic.year_built)));
    context.push_str(&format!(
        "- Estimated Value: {}\n\n",
        or_na(basic.estimated_value.map(|v| format!("${}", format_thousands(v))))
    ));

    context.push_str("SCHOOLS:\n");
    context.push_str(&format!(
        "- Elementary: {} (Rating: {}/10)\n",
        or_na(schools.elementary_school.as_deref()),
        rating(schools.elementary_rating)
    ));
    context.push_str(&format!(
        "- Middle: {} (Rating: {}/10)\n",
        or_na(schools.middle_school.as_deref()),
        rating(schools.middle_rating)
    ));
    context.push_str(&format!(
        "- High: {} (Rating: {}/10)\n\n",
        or_na(schools.high_school.as_deref()),
        rating(schools.high_rating)
    ));

    context.push_str("SAFETY:\n");
    context.push_str(&format!("- Crime Level: {}\n", or_na(crime.crime_level)));
    context.push_str(&format!(
        "- Crime Rate: {} per 100k\n\n",
        rating(crime.crime_rate)
    ));

    context.push_str("WALKABILITY & AMENITIES:\n");
    context.push_str(&format!("- Walk Score: {}/100\n", or_na(amenities.walk_score)));
    context.push_str(&format!(
        "- Transit Score: {}/100\n",
        or_na(amenities.transit_score)
    ));
    context.push_str(&format!("- Nearby Parks: {}\n\n", or_na(amenities.nearby_parks)));

    context.push_str("DATA QUALITY:\n");
    context.push_str(&format!(
        "- Overall Confidence: {}%\n",
        quality.overall_percent()
    ));
    context.push_str(&format!("- Missing Data: {}\n", missing));

    context
}

/// Rule-based multi-paragraph summary used when the model is unavailable.
pub fn fallback_summary(record: &AggregatedRecord) -> String {
    let paragraphs = [
        FALLBACK_MARKER.to_string(),
        property_paragraph(record),
        school_note(record),
        format!("{} {}", safety_note(record), walkability_note(record)),
        quality_paragraph(record),
    ];

    paragraphs.join("\n\n")
}

fn property_paragraph(record: &AggregatedRecord) -> String {
    let property = &record.property;
    let basic = &record.basic_info;
    let location = format!(
        "{}, {}, {} {}",
        property.address, property.city, property.state, property.zip_code
    );

    match (basic.bedrooms, basic.bathrooms) {
        (Some(bedrooms), Some(bathrooms)) => {
            let mut text = format!(
                "This {} at {} offers {} bedrooms and {} bathrooms",
                basic
                    .property_type
                    .as_deref()
                    .unwrap_or("property")
                    .to_lowercase(),
                location,
                bedrooms,
                bathrooms
            );
            if let Some(square_feet) = basic.square_feet {
                text.push_str(&format!(
                    " across {} square feet",
                    format_thousands(u64::from(square_feet))
                ));
            }
            text.push('.');
            if let Some(year) = basic.year_built {
                text.push_str(&format!(" It was built in {}", year));
                match basic.estimated_value {
                    Some(value) => text.push_str(&format!(
                        " and has an estimated value of ${}.",
                        format_thousands(value)
                    )),
                    None => text.push('.'),
                }
            }
            text
        }
        _ => format!(
            "Property records for {} are currently unavailable, so size and value details could not be confirmed.",
            location
        ),
    }
}

fn school_note(record: &AggregatedRecord) -> String {
    let schools = &record.schools;

    match schools.average_rating() {
        Some(avg) if avg >= 8.0 => format!(
            "Nearby schools are highly rated, averaging {:.1}/10, which makes the area attractive for families.",
            avg
        ),
        Some(avg) if avg >= 6.0 => format!(
            "Nearby schools are solid, averaging {:.1}/10.",
            avg
        ),
        Some(avg) => format!(
            "Nearby schools rate below average at {:.1}/10; families may want to research alternatives.",
            avg
        ),
        None => "School rating data is not available for this address.".to_string(),
    }
}

fn safety_note(record: &AggregatedRecord) -> String {
    let crime = &record.crime;
    let rate = crime
        .crime_rate
        .map(|r| format!("{:.1} per 100k", r))
        .unwrap_or_else(|| "rate unknown".to_string());

    let mut note = match crime.crime_level {
        Some(level @ (CrimeLevel::VeryLow | CrimeLevel::Low)) => format!(
            "The area reports a {} crime level ({}), which is reassuring for residents.",
            level.as_str().to_lowercase(),
            rate
        ),
        Some(CrimeLevel::Moderate) => format!(
            "Crime in the area is moderate ({}), in line with many urban neighbourhoods.",
            rate
        ),
        Some(CrimeLevel::High) => format!(
            "The area reports a high crime level ({}); buyers should review local safety data carefully.",
            rate
        ),
        None => return "Crime statistics could not be retrieved for this address.".to_string(),
    };

    if record
        .data_quality
        .crime_confidence
        .is_some_and(|c| c < LOW_CONFIDENCE)
    {
        note.push_str(" This safety estimate carries limited confidence.");
    }

    note
}

fn walkability_note(record: &AggregatedRecord) -> String {
    let amenities = &record.amenities;

    let Some(walk_score) = amenities.walk_score else {
        return "Walkability and amenities data is unavailable.".to_string();
    };

    let character = if walk_score >= 70 {
        "very walkable"
    } else if walk_score >= 50 {
        "somewhat walkable"
    } else {
        "largely car-dependent"
    };

    let mut note = format!(
        "With a walk score of {}/100 the neighbourhood is {}",
        walk_score, character
    );
    if let Some(transit) = amenities.transit_score {
        note.push_str(&format!(", with a transit score of {}/100", transit));
    }
    if let Some(parks) = amenities.nearby_parks {
        note.push_str(&format!(" and {} parks nearby", parks));
    }
    note.push('.');
    note
}

fn quality_paragraph(record: &AggregatedRecord) -> String {
    let quality = &record.data_quality;
    let mut text = format!(
        "Overall data confidence for this property is {}%.",
        quality.overall_percent()
    );

    if quality.missing_data_sources.is_empty() {
        text.push_str(" All data sources responded.");
    } else {
        text.push_str(&format!(
            " Data was unavailable from: {}.",
            quality.missing_data_sources.join(", ")
        ));
    }

    text
}

/// System prompt for property summaries
const SYSTEM_PROMPT: &str = r#"You are a real estate analyst helping potential home buyers. Generate a concise, insightful 3-4 paragraph summary of the property data provided. Focus on:
1. Key property highlights and value proposition
2. School quality and family-friendliness
3. Safety and neighborhood character
4. Walkability and lifestyle factors

Be honest about data gaps and mention the overall data confidence score. Write in a professional but friendly tone. Keep it under 200 words."#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::merge;
    use crate::address::parse_address;
    use crate::sources::{amenities, crime_stats, property_records, school_ratings};
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;

    fn record_for(sample: f64) -> AggregatedRecord {
        let address = "123 Main St, Springfield, IL 62701";
        merge(
            parse_address(address),
            property_records::synthesize(sample),
            school_ratings::synthesize(address, sample),
            crime_stats::synthesize(sample),
            amenities::synthesize(sample),
            Utc::now(),
        )
    }

    struct FixedText(&'static str);

    #[async_trait]
    impl TextGenerator for FixedText {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl TextGenerator for Unreachable {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Err(anyhow::anyhow!("Cannot connect to text generation API"))
        }
    }

    #[test]
    fn test_context_contains_every_section() {
        let context = build_context(&record_for(0.34));

        assert!(context.contains("Property Address: 123 Main St, Springfield, IL 62701"));
        assert!(context.contains("- Type: Condo"));
        assert!(context.contains("- Square Feet: 2,020"));
        assert!(context.contains("- Estimated Value: $472,000"));
        assert!(context.contains("- Elementary: 123 Elementary (Rating: 6.7/10)"));
        assert!(context.contains("- Crime Level: Low"));
        assert!(context.contains("- Walk Score: 40/100"));
        assert!(context.contains("- Missing Data: None"));
    }

    #[test]
    fn test_context_placeholders_for_missing_data() {
        let context = build_context(&record_for(0.05));

        assert!(context.contains("- Type: Unknown"));
        assert!(context.contains("- Bedrooms: N/A"));
        assert!(context.contains("- Elementary: N/A (Rating: N/A/10)"));
        assert!(context.contains("- Overall Confidence: 0%"));
        assert!(context.contains(
            "- Missing Data: Property Records, School Ratings, Crime Statistics, Amenities Data"
        ));
    }

    #[test]
    fn test_fallback_is_marked_and_mentions_confidence() {
        let record = record_for(0.34);
        let summary = fallback_summary(&record);

        assert!(summary.starts_with(FALLBACK_MARKER));
        assert!(summary.contains(&format!(
            "{}%",
            record.data_quality.overall_percent()
        )));
        assert!(summary.contains("offers 3 bedrooms and 2 bathrooms"));
        assert!(summary.contains("low crime level"));
        assert!(summary.contains("largely car-dependent"));
        assert!(summary.split("\n\n").count() >= 4);
    }

    #[test]
    fn test_fallback_with_no_data_is_not_empty() {
        let summary = fallback_summary(&record_for(0.0));

        assert!(!summary.trim().is_empty());
        assert!(summary.contains("Overall data confidence for this property is 0%."));
        assert!(summary.contains("currently unavailable"));
        assert!(summary.contains("Crime statistics could not be retrieved"));
    }

    #[test]
    fn test_fallback_flags_low_confidence_safety() {
        // crime confidence at 0.62 is 0.748, at 0.34 it is 0.636
        assert!(fallback_summary(&record_for(0.34)).contains("limited confidence"));
        assert!(!fallback_summary(&record_for(0.62)).contains("limited confidence"));
    }

    #[test]
    fn test_walkability_bands() {
        assert!(fallback_summary(&record_for(0.62)).contains("somewhat walkable"));
        assert!(fallback_summary(&record_for(0.9)).contains("very walkable"));
    }

    #[tokio::test]
    async fn test_uses_generated_text() {
        let generator = SummaryGenerator::new(Some(Arc::new(FixedText("  Great starter home.  "))));
        let summary = generator.summarize(&record_for(0.34)).await;
        assert_eq!(summary, "Great starter home.");
    }

    #[tokio::test]
    async fn test_falls_back_on_error() {
        let generator = SummaryGenerator::new(Some(Arc::new(Unreachable)));
        let summary = generator.summarize(&record_for(0.34)).await;
        assert!(summary.starts_with(FALLBACK_MARKER));
    }

    #[tokio::test]
    async fn test_falls_back_on_empty_text() {
        let generator = SummaryGenerator::new(Some(Arc::new(FixedText("   "))));
        let summary = generator.summarize(&record_for(0.34)).await;
        assert!(summary.starts_with(FALLBACK_MARKER));
    }

    #[tokio::test]
    async fn test_fallback_only() {
        let summary = SummaryGenerator::fallback_only()
            .summarize(&record_for(0.62))
            .await;
        assert!(summary.contains("Overall data confidence"));
    }
}
