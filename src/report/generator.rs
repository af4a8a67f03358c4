//! Markdown property brief generation.
//!
//! This module renders an aggregated property record, and its summary when
//! one was produced, as a Markdown brief for the command line.

use super::{format_thousands, or_na};
use crate::models::{
    AmenitiesSection, CrimeLevel, CrimeSection, DataQuality, ParsedAddress, PropertyResponse,
    SchoolsSection,
};
use anyhow::Result;

/// Generate a complete Markdown brief.
pub fn generate_markdown_brief(response: &PropertyResponse) -> String {
    let record = &response.record;
    let mut output = String::new();

    // Title
    output.push_str(&generate_header(&record.property, &record.data_quality));

    // Summary
    if let Some(ref summary) = response.ai_summary {
        output.push_str(&generate_summary_section(summary));
    }

    // Property details
    output.push_str(&generate_details_section(response));

    // Schools
    output.push_str(&generate_schools_section(
        &record.schools,
        record.data_quality.schools_confidence,
    ));

    // Safety
    output.push_str(&generate_safety_section(
        &record.crime,
        record.data_quality.crime_confidence,
    ));

    // Walkability
    output.push_str(&generate_walkability_section(
        &record.amenities,
        record.data_quality.amenities_confidence,
    ));

    // Footer
    output.push_str(&format!(
        "---\n\n*Data last updated: {}*\n",
        record.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output
}

/// Confidence badge, e.g. `(82% confidence)`.
fn confidence_badge(confidence: Option<f64>) -> String {
    match confidence {
        Some(c) => format!(" *({}% confidence)*", (c * 100.0).round() as i64),
        None => String::new(),
    }
}

/// Generate the title block with the overall data quality.
fn generate_header(property: &ParsedAddress, quality: &DataQuality) -> String {
    let mut section = String::new();

    section.push_str(&format!("# {}\n\n", property.address));
    section.push_str(&format!(
        "{}, {} {}\n\n",
        property.city, property.state, property.zip_code
    ));
    section.push_str(&format!(
        "**Overall Data Quality:** {}%\n\n",
        quality.overall_percent()
    ));

    if !quality.missing_data_sources.is_empty() {
        section.push_str(&format!(
            "> ⚠️ **Missing data from:** {}\n\n",
            quality.missing_data_sources.join(", ")
        ));
    }

    section
}

fn generate_summary_section(summary: &str) -> String {
    if summary.is_empty() {
        return String::new();
    }

    format!("## Summary\n\n{}\n\n", summary)
}

/// Generate the property details table.
fn generate_details_section(response: &PropertyResponse) -> String {
    let basic = &response.record.basic_info;
    let mut section = String::new();

    section.push_str(&format!(
        "## Property Details{}\n\n",
        confidence_badge(response.record.data_quality.basic_info_confidence)
    ));
    section.push_str("| Type | Bedrooms | Bathrooms | Square Feet | Year Built | Estimated Value |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} | **{}** |\n\n",
        or_na(basic.property_type.as_deref()),
        or_na(basic.bedrooms),
        or_na(basic.bathrooms),
        or_na(basic.square_feet.map(|v| format_thousands(u64::from(v)))),
        or_na(basic.year_built),
        or_na(basic.estimated_value.map(|v| format!("${}", format_thousands(v)))),
    ));

    section
}

/// Generate the schools section.
fn generate_schools_section(schools: &SchoolsSection, confidence: Option<f64>) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## Nearby Schools{}\n\n",
        confidence_badge(confidence)
    ));

    let rows = [
        ("Elementary", &schools.elementary_school, schools.elementary_rating),
        ("Middle", &schools.middle_school, schools.middle_rating),
        ("High", &schools.high_school, schools.high_rating),
    ];

    for (level, name, rating) in rows {
        match name {
            Some(name) => section.push_str(&format!(
                "- **{}** ({} School): {}\n",
                name,
                level,
                rating
                    .map(|r| format!("{:.1}/10", r))
                    .unwrap_or_else(|| "N/A".to_string())
            )),
            None => section.push_str(&format!("- {} School: Not available\n", level)),
        }
    }
    section.push('\n');

    section
}

/// Generate the safety section.
fn generate_safety_section(crime: &CrimeSection, confidence: Option<f64>) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Safety{}\n\n", confidence_badge(confidence)));

    match crime.crime_level {
        Some(level) => {
            let badge = match level {
                CrimeLevel::VeryLow | CrimeLevel::Low => "🟢",
                CrimeLevel::Moderate => "🟡",
                CrimeLevel::High => "🔴",
            };
            section.push_str(&format!("- **Crime Level:** {} {}\n", badge, level));
            if let Some(rate) = crime.crime_rate {
                section.push_str(&format!("- **Crime Rate:** {:.1} per 100k\n", rate));
            }
        }
        None => section.push_str("No crime data available\n"),
    }
    section.push('\n');

    section
}

/// Render a 0-100 score as a ten-segment bar.
fn score_bar(score: u32) -> String {
    let filled = (score.min(100) / 10) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Generate the walkability and transit section.
fn generate_walkability_section(amenities: &AmenitiesSection, confidence: Option<f64>) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## Walkability & Transit{}\n\n",
        confidence_badge(confidence)
    ));

    match amenities.walk_score {
        Some(walk) => {
            section.push_str(&format!("- **Walk Score:** `{}` {}/100\n", score_bar(walk), walk));
            if let Some(transit) = amenities.transit_score {
                section.push_str(&format!(
                    "- **Transit Score:** `{}` {}/100\n",
                    score_bar(transit),
                    transit
                ));
            }
            section.push_str(&format!(
                "- **Nearby Parks:** {}\n",
                or_na(amenities.nearby_parks)
            ));
        }
        None => section.push_str("No amenities data available\n"),
    }
    section.push('\n');

    section
}

/// Generate a JSON brief.
pub fn generate_json_brief(response: &PropertyResponse) -> Result<String> {
    serde_json::to_string_pretty(response).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::parse_address;
    use crate::aggregator::merge;
    use crate::sources::{amenities, crime_stats, property_records, school_ratings};
    use chrono::Utc;

    fn create_test_response(sample: f64, summary: Option<&str>) -> PropertyResponse {
        let address = "123 Main St, Springfield, IL 62701";
        PropertyResponse {
            record: merge(
                parse_address(address),
                property_records::synthesize(sample),
                school_ratings::synthesize(address, sample),
                crime_stats::synthesize(sample),
                amenities::synthesize(sample),
                Utc::now(),
            ),
            ai_summary: summary.map(String::from),
        }
    }

    #[test]
    fn test_generate_markdown_brief() {
        let response = create_test_response(0.34, Some("A pleasant condo."));
        let markdown = generate_markdown_brief(&response);

        assert!(markdown.contains("# 123 Main St"));
        assert!(markdown.contains("Springfield, IL 62701"));
        assert!(markdown.contains("## Summary\n\nA pleasant condo."));
        assert!(markdown.contains("## Property Details *(80% confidence)*"));
        assert!(markdown.contains("$472,000"));
        assert!(markdown.contains("**123 Elementary** (Elementary School): 6.7/10"));
        assert!(markdown.contains("Crime Level:** 🟢 Low"));
        assert!(!markdown.contains("Missing data from"));
    }

    #[test]
    fn test_missing_sources_are_flagged() {
        let response = create_test_response(0.13, None);
        let markdown = generate_markdown_brief(&response);

        assert!(markdown.contains("**Missing data from:** School Ratings, Crime Statistics"));
        assert!(markdown.contains("- Middle School: Not available"));
        assert!(markdown.contains("No crime data available"));
        assert!(!markdown.contains("## Summary"));
    }

    #[test]
    fn test_score_bar() {
        assert_eq!(score_bar(0), "░░░░░░░░░░");
        assert_eq!(score_bar(47), "████░░░░░░");
        assert_eq!(score_bar(100), "██████████");
    }

    #[test]
    fn test_generate_json_brief() {
        let response = create_test_response(0.34, Some("text"));
        let json = generate_json_brief(&response).unwrap();

        assert!(json.contains("\"dataQuality\""));
        assert!(json.contains("\"overallConfidence\""));
        assert!(json.contains("\"aiSummary\": \"text\""));
        assert!(json.contains("\"zipCode\": \"62701\""));
    }
}
