//! Timestamp parsing for transaction records.
//!
//! Historical records were exported by a legacy database in a
//! zone-qualified text form (`Fri Aug 30 18:24:06 CST 2024`); newer
//! records use ISO 8601. Both are accepted without the caller knowing
//! which one is present.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{DomainError, Result};

/// `<month> <day> <HH:MM:SS> <year>` once the weekday and zone are removed.
const LEGACY_FORMAT: &str = "%b %d %H:%M:%S %Y";

const WEEKDAYS: &[&str] = &["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a transaction timestamp, trying the legacy export format first
/// and falling back to ISO 8601.
///
/// Values without an explicit offset are read as UTC wall-clock time.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    parse_legacy(trimmed)
        .or_else(|| parse_standard(trimmed))
        .ok_or_else(|| DomainError::InvalidTimestamp(input.to_string()))
}

/// Parses a timestamp carried in a JSON payload.
///
/// Only JSON strings are accepted; any other JSON type fails with
/// [`DomainError::InvalidTimestampType`].
pub fn parse_timestamp_value(value: &serde_json::Value) -> Result<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => parse_timestamp(s),
        other => Err(DomainError::InvalidTimestampType(json_type_name(other))),
    }
}

fn parse_legacy(input: &str) -> Option<DateTime<Utc>> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let [weekday, month, day, time, zone, year] = tokens.as_slice() else {
        return None;
    };

    // The zone abbreviation is not resolved; the legacy exporter wrote
    // local wall-clock time next to it.
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    // The weekday must be a real abbreviation but is not checked against
    // the date; legacy exports carry mismatched ones.
    if !WEEKDAYS.iter().any(|w| w.eq_ignore_ascii_case(weekday)) {
        return None;
    }

    let rest = format!("{month} {day} {time} {year}");
    NaiveDateTime::parse_from_str(&rest, LEGACY_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_standard(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
