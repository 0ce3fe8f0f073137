//! Time and date parsing utilities.
//!
//! Issue timestamps are UTC, truncated to milliseconds, and always rendered
//! as fixed-width RFC3339 (`2025-01-15T12:00:00.000Z`). Fixed width keeps the
//! stored strings ordered the same way as the instants they encode.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc};

/// Current time at storage precision.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Render a timestamp in the stored/wire format.
#[must_use]
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a timestamp given by a client or read back from storage.
///
/// Supports:
/// - RFC3339: `2025-01-15T12:00:00.000Z`, `2025-01-15T12:00:00+02:00`
/// - RFC2822 / HTTP dates: `Wed, 15 Jan 2025 12:00:00 GMT`
/// - SQLite style: `2025-01-15 12:00:00`
///
/// Returns `None` for anything else.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    None
}

/// Serde adapter writing timestamps with [`format_timestamp`].
pub mod millis {
    use super::{format_timestamp, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    /// # Errors
    ///
    /// Never fails for string serializers.
    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(dt))
    }

    /// # Errors
    ///
    /// Returns an error if the value is not a recognizable timestamp.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }
}
