//! Date and time normalization for service-provided values.

use chrono::{NaiveDate, NaiveTime};

// Two-digit year forms go first: `%Y` would accept "24" as year 24.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%y",
    "%d.%m.%y",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%d %b %Y",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p", "%I:%M%p"];

/// Render a date as `YYYY-MM-DD` when it parses, otherwise return it trimmed.
///
/// Slash dates are read month-first, matching the service's own convention.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Render a time as `HH:MM:SS` when it parses, otherwise return it trimmed.
pub fn normalize_time(raw: &str) -> String {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| raw.to_string())
}
