//! ISO 8601 conversions
//!
//! Every timestamp that crosses a boundary goes through these helpers so the
//! `Z` suffix and fractional-second rules stay consistent.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};

use super::TimeError;

/// Offset-aware layouts accepted by [`to_datetime`]
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Naive layouts accepted by [`to_datetime`], interpreted as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// ISO 8601 timestamp; a zero offset is written `Z` and microseconds only
/// appear when non-zero
pub fn to_timestamp<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    let dt = dt.fixed_offset();
    let micros = (dt.nanosecond() % 1_000_000_000) / 1_000;

    let mut out = dt.format("%Y-%m-%dT%H:%M:%S").to_string();
    if micros != 0 {
        out.push_str(&format!(".{micros:06}"));
    }
    if dt.offset().local_minus_utc() == 0 {
        out.push('Z');
    } else {
        out.push_str(&dt.format("%:z").to_string());
    }
    out
}

/// Naive datetimes are taken as UTC
pub fn naive_to_timestamp(dt: &NaiveDateTime) -> String {
    to_timestamp(&dt.and_utc())
}

/// Parse an ISO 8601 timestamp. `Z` means `+00:00`; naive and date-only
/// inputs are taken as UTC.
pub fn to_datetime(timestamp: &str) -> Result<DateTime<FixedOffset>, TimeError> {
    let normalized = timestamp.trim().replace('Z', "+00:00");

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Ok(dt);
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Ok(dt.and_utc().fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
    }

    Err(TimeError::InvalidTimestamp(timestamp.to_string()))
}

/// Parse and convert to UTC
pub fn to_utc(timestamp: &str) -> Result<DateTime<Utc>, TimeError> {
    to_datetime(timestamp).map(|dt| dt.with_timezone(&Utc))
}

/// Current UTC time as an ISO 8601 string
pub fn now() -> String {
    to_timestamp(&Utc::now())
}

/// `YYYY-MM-DD`
pub fn to_datestring(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Seconds since the Unix epoch
pub fn to_unix_timestamp<Tz: TimeZone>(dt: &DateTime<Tz>) -> i64 {
    dt.timestamp()
}

pub fn from_unix_timestamp(ts: i64) -> Result<DateTime<Utc>, TimeError> {
    DateTime::<Utc>::from_timestamp(ts, 0).ok_or(TimeError::OutOfRange(ts))
}

pub fn now_unix() -> i64 {
    to_unix_timestamp(&Utc::now())
}
