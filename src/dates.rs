//! # Nightscout Timestamp Handling
//!
//! Nightscout stores timestamps as ISO-8601 text, but not consistently:
//! `created_at` and `sysTime` carry milliseconds (`2020-12-14T04:15:02.000Z`)
//! while the `timestamp` fields written by Loop do not
//! (`2020-12-14T04:15:02Z`). Both forms are accepted on decode; only the
//! millisecond form is ever emitted.
//!
//! The zone designator may be `Z` or a numeric offset (`+0000`, `+00:00`).
//! Every parsed value is normalized to UTC.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// `yyyy-MM-dd'T'HH:mm:ss.SSS`, tried first.
const PRIMARY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
const PRIMARY_FORMAT_WITH_OFFSET: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// `yyyy-MM-dd'T'HH:mm:ss`, tried when the primary format rejects the text.
const SECONDARY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const SECONDARY_FORMAT_WITH_OFFSET: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Output format for query parameters.
const EMIT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// A timestamp matched neither accepted format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot decode date string {text:?}")]
pub struct DateParseError {
    pub text: String,
}

/// Parse a Nightscout timestamp, primary format first, then secondary.
///
/// # Example
/// ```
/// use nightscout_client::dates::parse_timestamp;
///
/// let with_millis = parse_timestamp("2020-12-14T04:15:02.000Z").unwrap();
/// let without = parse_timestamp("2020-12-14T04:15:02Z").unwrap();
/// assert_eq!(with_millis, without);
/// ```
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, DateParseError> {
    let text = text.trim();
    parse_with(text, PRIMARY_FORMAT, PRIMARY_FORMAT_WITH_OFFSET)
        .or_else(|| parse_with(text, SECONDARY_FORMAT, SECONDARY_FORMAT_WITH_OFFSET))
        .ok_or_else(|| DateParseError {
            text: text.to_string(),
        })
}

fn parse_with(text: &str, format: &str, format_with_offset: &str) -> Option<DateTime<Utc>> {
    if let Some(local) = text.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(local, format).ok()?;
        return Some(Utc.from_utc_datetime(&naive));
    }

    DateTime::parse_from_str(text, format_with_offset)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render a timestamp the way Nightscout query filters expect it.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(EMIT_FORMAT).to_string()
}

/// Serde adapter for required timestamp fields.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_timestamp(&text).map_err(serde::de::Error::custom)
}

/// Serde adapter for optional timestamp fields (`null` or missing → `None`).
///
/// Pair with `#[serde(default)]` so a missing key is accepted.
pub mod option {
    use super::parse_timestamp;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => parse_timestamp(&text)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
