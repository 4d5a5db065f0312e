//! Timestamp parsing for case dates.
//!
//! Exports of the same CRM data arrive in several shapes: plain dates, naive
//! date-times with a space or `T` separator, RFC 3339 strings with an offset,
//! and epoch milliseconds when the data went through a JSON round-trip.
//! Everything is normalized to a naive UTC date-time.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Milliseconds per day
const MS_PER_DAY: f64 = 86_400_000.0;

/// Parses a timestamp field, returning `None` for anything unrecognized.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) && s.len() > 8 {
        let millis: i64 = s.parse().ok()?;
        return DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    // "2024-01-05 10:00:00+00:00" is what pandas writes for tz-aware columns
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_utc());
    }
    if let Some(stripped) = s.strip_suffix('Z') {
        return parse_naive(stripped);
    }

    parse_naive(s)
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Elapsed fractional days from `created` to `closed`. Negative when the
/// case was closed before it was created.
pub fn days_between(created: NaiveDateTime, closed: NaiveDateTime) -> f64 {
    (closed - created).num_milliseconds() as f64 / MS_PER_DAY
}

/// Calendar month bucket, `YYYY-MM`
pub fn month_key(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m").to_string()
}
