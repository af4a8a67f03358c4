//! Best-effort address parsing.
//!
//! Addresses are free text. The parser splits on commas and spaces without
//! validating anything; parts that cannot be found are replaced by
//! placeholders so parsing never fails.

use crate::models::ParsedAddress;

pub const UNKNOWN_CITY: &str = "Unknown City";
pub const UNKNOWN_STATE: &str = "XX";
pub const UNKNOWN_ZIP: &str = "00000";

/// Parse `"<street>, <city>, <state> <zip>"` into its parts.
pub fn parse_address(input: &str) -> ParsedAddress {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();

    let street = match parts.first() {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => input.to_string(),
    };

    let city = match parts.get(1) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => UNKNOWN_CITY.to_string(),
    };

    let mut state_zip = parts
        .get(2)
        .filter(|s| !s.is_empty())
        .map(|s| s.split(' ').filter(|t| !t.is_empty()))
        .into_iter()
        .flatten();

    let state = state_zip
        .next()
        .map(String::from)
        .unwrap_or_else(|| UNKNOWN_STATE.to_string());
    let zip_code = state_zip
        .next()
        .map(String::from)
        .unwrap_or_else(|| UNKNOWN_ZIP.to_string());

    ParsedAddress {
        address: street,
        city,
        state,
        zip_code,
    }
}
