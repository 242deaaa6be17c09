// src/utils/clock.rs
//! Wall-clock access and the timestamp format used in credentials.
//!
//! Credential timestamps are ISO-8601 UTC with millisecond precision and a
//! `Z` suffix (`2024-05-01T08:30:00.000Z`). Readings are truncated to whole
//! milliseconds so that a credential parsed back from JSON compares equal to
//! the one that was issued. Parsing accepts only that exact form: any other
//! precision or offset would re-serialize to different bytes and change the
//! credential's fingerprint.

use chrono::{DateTime, DurationRound, Duration, SecondsFormat, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        truncate_millis(Utc::now())
    }
}

/// A clock that always reads the same instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        truncate_millis(self.0)
    }
}

/// Drops sub-millisecond precision.
pub fn truncate_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .duration_trunc(Duration::milliseconds(1))
        .unwrap_or(instant)
}

/// Formats an instant the way credentials carry it.
pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter for credential timestamps.
pub mod timestamp {
    use super::format_timestamp;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(instant))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let instant = DateTime::parse_from_rfc3339(&text)
            .map(|instant| instant.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)?;
        if format_timestamp(&instant) != text {
            return Err(serde::de::Error::custom(format!(
                "timestamp `{}` is not UTC with millisecond precision",
                text
            )));
        }
        Ok(instant)
    }
}
