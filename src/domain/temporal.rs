//! Conversions between textual and structured temporal values.
//!
//! Dates travel as text on the wire and in database rows. Parsing is strict
//! about content but lenient about the handful of layouts the store and
//! clients actually produce.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::error::RegistryError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Years representable as four-digit `YYYY` text without an era marker.
const DATE_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// PostgreSQL `timestamptz::text` layout, e.g. `2024-05-01 10:00:00.123+00`.
const PG_TIMESTAMPTZ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%#z";

/// Naive layout assumed to be UTC, e.g. `2024-05-01 10:00:00`.
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parses a calendar date.
///
/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, in which case the UTC date
/// of that instant is used. The year must lie in `1..=9999`.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidTemporal`] when `text` matches neither
/// layout or the year is out of range.
pub fn parse_date(field: &'static str, text: &str) -> Result<NaiveDate, RegistryError> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|ts| ts.with_timezone(&Utc).date_naive())
        })
        .filter(|date| DATE_YEARS.contains(&date.year()))
        .ok_or_else(|| invalid(field, text))
}

/// Parses an instant.
///
/// Accepts RFC 3339, the PostgreSQL `timestamptz` text layout, and a naive
/// `YYYY-MM-DD HH:MM:SS[.f]` layout which is read as UTC.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidTemporal`] when `text` matches no layout.
pub fn parse_timestamp(field: &'static str, text: &str) -> Result<DateTime<Utc>, RegistryError> {
    let trimmed = text.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_str(trimmed, PG_TIMESTAMPTZ_FORMAT))
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(trimmed, NAIVE_TIMESTAMP_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        })
        .ok_or_else(|| invalid(field, text))
}

/// Formats a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Formats an instant as RFC 3339 with microsecond precision and a `Z` suffix.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn invalid(field: &'static str, text: &str) -> RegistryError {
    RegistryError::InvalidTemporal {
        field,
        value: text.to_string(),
    }
}
