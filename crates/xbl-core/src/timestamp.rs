//! ISO 8601 timestamps as written to the token file and returned by the platform.
//!
//! All timestamps are held at microsecond precision. The platform answers with
//! seven fractional digits (`2024-01-01T00:00:00.1234567Z`) while the token file
//! stores six, so values are truncated on the way in to keep a saved token equal
//! to the token it was saved from.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serializer};

use crate::errors::CoreError;

/// Format used when writing timestamps to the token file.
pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Render a timestamp in the token-file format.
#[must_use]
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.format(FORMAT).to_string()
}

/// Truncate a timestamp to microsecond precision.
#[must_use]
pub fn normalize(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

/// Parse an ISO 8601 timestamp. Values without an offset are taken as UTC.
///
/// # Errors
///
/// Returns `CoreError::InvalidTimestamp` if the value is neither RFC 3339 nor a
/// zone-less `YYYY-MM-DDTHH:MM:SS[.fff]` timestamp.
pub fn parse(value: &str) -> Result<DateTime<Utc>, CoreError> {
    let trimmed = value.trim();
    let parsed = DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
        })
        .map_err(|e| CoreError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })?;
    Ok(normalize(parsed))
}

/// Serde adapter: `#[serde(with = "xbl_core::timestamp")]`.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(ts))
}

/// Serde adapter: `#[serde(with = "xbl_core::timestamp")]`.
///
/// # Errors
///
/// Returns a deserializer error if the string is not a valid timestamp.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}
