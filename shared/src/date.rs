//! Timestamp helpers
//!
//! The backend sends ISO 8601 strings, sometimes without an offset
//! (`2024-05-01T10:00:00.123456`). Offset-less values are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parses a backend timestamp into a UTC instant.
///
/// Accepts RFC 3339, a naive date-time, or a bare date (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// The UTC calendar date of a backend timestamp.
pub fn calendar_date(s: &str) -> Option<NaiveDate> {
    parse_timestamp(s).map(|dt| dt.date_naive())
}

/// Parses a `YYYY-MM-DD` date as produced by an `<input type="date">`.
pub fn parse_date_input(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Short human-readable form used in tables.
pub fn display_timestamp(s: &str) -> String {
    match parse_timestamp(s) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_normalised_to_utc() {
        let date = calendar_date("2024-05-01T23:30:00-02:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
    }

    #[test]
    fn naive_timestamps_are_utc() {
        let dt = parse_timestamp("2024-05-01T10:00:00.123456").unwrap();
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert!(parse_timestamp("2024-05-01 10:00:00").is_some());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_date_input("05/01/2024").is_none());
    }

    #[test]
    fn display_falls_back_to_raw_text() {
        assert_eq!(display_timestamp("2024-05-01T10:07:00Z"), "2024-05-01 10:07");
        assert_eq!(display_timestamp("soon"), "soon");
    }
}
