//! Launch-date parsing.
//!
//! Cards render the launch date as free text after "Started running on".
//! Observed shapes:
//!
//! ```text
//! Jan 5, 2025
//! January 5, 2025
//! 5 Jan 2025
//! 2025-01-05
//! 2025-01-05T10:30:00Z
//! 2025-01-05T10:30:00+02:00
//! 2025-01-05T10:30:00
//! ```
//!
//! Anything else is treated as malformed and yields `None`; callers fall
//! back to impression-only classification.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%d %b %Y", "%d %B %Y"];

/// Parses a launch date string into a calendar date (UTC for zoned input).
#[must_use]
pub fn parse_launch_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim().trim_end_matches('.').trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc().date());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}
