//! `measuredAt` parsing.
//!
//! Devices report the capture time as an ISO-8601 local date-time
//! (`2025-07-24T15:00:00`). Seconds and fractional seconds are optional.
//! Values carrying an explicit offset are normalized to UTC.

use chrono::{DateTime, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid measuredAt timestamp `{input}`: expected ISO-8601 like 2025-07-24T15:00:00")]
pub struct TimestampError {
    pub input: String,
}

const LOCAL_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

pub fn parse_measured_at(input: &str) -> Result<NaiveDateTime, TimestampError> {
    let trimmed = input.trim();

    for format in LOCAL_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|ts| ts.naive_utc())
        .map_err(|_| TimestampError {
            input: input.to_string(),
        })
}
