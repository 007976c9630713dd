//! Wire formats for calendar dates and timestamps.
//!
//! - Dates are `YYYY-MM-DD` (chrono's default `NaiveDate` serde form).
//! - Timestamps are RFC 3339 in UTC with second precision:
//!   `2025-01-10T08:00:00Z`. Decoding accepts any RFC 3339 offset and
//!   normalizes to UTC.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// Calendar-day format used by every date field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Formats a timestamp in the fixed wire form.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses a `YYYY-MM-DD` field, reporting `field` on failure.
pub fn parse_date(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| ValidationError::date(field))
}

/// Parses an optional date, falling back to `default` when blank.
pub fn parse_date_or(field: &str, raw: Option<&str>, default: NaiveDate) -> ValidationResult<NaiveDate> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(s) => parse_date(field, s),
    }
}

/// `#[serde(with = "rfc3339")]` for `DateTime<Utc>`.
pub mod rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

/// `#[serde(with = "rfc3339_option")]` for `Option<DateTime<Utc>>`.
///
/// Missing, null and empty-string values all decode to `None`.
pub mod rfc3339_option {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => s.serialize_str(&super::format_timestamp(ts)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(de::Error::custom),
        }
    }
}
