//! Shared "best effort" date parsing (§4.1 "Date parsing is shared").
//!
//! Tries a fixed ordered list of formats; on miss, returns `None` rather
//! than failing the parse — callers warn-and-null per the per-parser
//! failure policy table.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%b-%Y", "%B %d, %Y"];

/// Parses a free-form date string, trying RFC 3339 first, then a fixed list
/// of ISO-like and common locale formats. Returns `None` on total miss.
#[must_use]
pub fn parse_flexible_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(naive) = NaiveDate::parse_from_str(trimmed, fmt) {
            return naive.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339() {
        assert!(parse_flexible_date("2024-03-01T12:30:00Z").is_some());
    }

    #[test]
    fn parses_iso_date_only() {
        assert!(parse_flexible_date("2024-03-01").is_some());
    }

    #[test]
    fn parses_us_locale() {
        assert!(parse_flexible_date("03/01/2024 12:30:00").is_some());
    }

    #[test]
    fn returns_none_on_garbage() {
        assert!(parse_flexible_date("not a date").is_none());
    }
}
