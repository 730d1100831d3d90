//! Glucose entries (`/api/v1/entries/sgv.json`).
//!
//! A raw entry looks like this:
//!
//! ```json
//! {
//!   "_id": "5feb436be0d1aa28f0556ec5",
//!   "sgv": 119,
//!   "date": 1609253671000,
//!   "dateString": "2020-12-29T14:54:31.000Z",
//!   "trend": 3,
//!   "direction": "FortyFiveUp",
//!   "device": "share2",
//!   "type": "sgv",
//!   "utcOffset": 0,
//!   "sysTime": "2020-12-29T14:54:31.000Z",
//!   "mills": 1609253671000
//! }
//! ```
//!
//! Known `device` values: `share2` (Dexcom Share credentials entered in
//! Loop), `loop://iPhone` (readings intercepted over Bluetooth, no trend) and
//! the legacy `CGMBLEKit Dexcom G6 21.0` uploader whose entries duplicate the
//! others and are discarded.

use crate::decode::decode_records;
use crate::error::Result;
use crate::trend::normalize_trend;
use crate::value::AnyValue;
use crate::GlucoseReading;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Device tag of the legacy uploader whose entries are ignored.
pub const LEGACY_DEVICE: &str = "CGMBLEKit Dexcom G6 21.0";

const ENDPOINT: &str = "entries";

/// An entry as stored by Nightscout, before normalization.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub sgv: i32,
    #[serde(deserialize_with = "crate::dates::deserialize")]
    pub date_string: DateTime<Utc>,
    #[serde(default)]
    pub trend: Option<AnyValue>,
    #[serde(default)]
    pub direction: Option<AnyValue>,
    pub device: String,
    /// Usually `"sgv"`, but some uploaders send a number.
    #[serde(rename = "type")]
    pub kind: AnyValue,
    #[serde(default)]
    pub utc_offset: Option<AnyValue>,
    #[serde(deserialize_with = "crate::dates::deserialize")]
    pub sys_time: DateTime<Utc>,
    #[serde(default)]
    pub mills: Option<AnyValue>,
}

impl EntryRecord {
    /// Convert to a [`GlucoseReading`] with a normalized trend.
    pub fn to_reading(&self) -> GlucoseReading {
        GlucoseReading {
            id: self.id.clone(),
            value: self.sgv,
            system_time: self.sys_time,
            display_time: self.date_string,
            realtime_value: None,
            smoothed_value: None,
            trend_rate: normalize_trend(self.trend.as_ref()),
            trend_description: String::new(),
        }
    }

    pub fn is_legacy_device(&self) -> bool {
        self.device == LEGACY_DEVICE
    }
}

/// Turn decoded entries into readings, dropping legacy-device records and
/// sensor-error values (`sgv <= 0`).
pub fn readings_from_records(records: &[EntryRecord]) -> Vec<GlucoseReading> {
    records
        .iter()
        .filter(|record| !record.is_legacy_device())
        .map(EntryRecord::to_reading)
        .filter(|reading| reading.value > 0)
        .collect()
}

/// Decode a `sgv.json` response body into glucose readings.
pub fn decode_readings(body: &[u8]) -> Result<Vec<GlucoseReading>> {
    let records: Vec<EntryRecord> = decode_records(ENDPOINT, body)?;
    Ok(readings_from_records(&records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NightscoutError;
    use chrono::TimeZone;

    fn entry(id: &str, sgv: i32, device: &str, trend: &str) -> String {
        format!(
            r#"{{"_id": "{id}", "sgv": {sgv}, "dateString": "2020-12-29T14:54:31.000Z",
                "trend": {trend}, "device": "{device}", "type": "sgv", "utcOffset": 0,
                "sysTime": "2020-12-29T14:54:31.000Z", "mills": 1609253671000}}"#
        )
    }

    #[test]
    fn test_decodes_numeric_and_label_trends() {
        let body = format!(
            "[{}, {}]",
            entry("a", 119, "share2", "3"),
            entry("b", 121, "share2", "\"FortyFiveUp\"")
        );
        let readings = decode_readings(body.as_bytes()).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].trend_rate, 3.0);
        assert_eq!(readings[1].trend_rate, 2.0);
        assert_eq!(
            readings[0].system_time,
            Utc.with_ymd_and_hms(2020, 12, 29, 14, 54, 31).unwrap()
        );
        assert!(readings[0].trend_description.is_empty());
    }

    #[test]
    fn test_missing_trend_is_zero() {
        let body = r#"[{"_id": "c", "sgv": 100, "dateString": "2020-12-29T14:54:31Z",
            "device": "loop://iPhone", "type": "sgv", "sysTime": "2020-12-29T14:54:31Z"}]"#;
        let readings = decode_readings(body.as_bytes()).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].trend_rate, 0.0);
    }

    #[test]
    fn test_drops_sensor_errors_and_legacy_device() {
        let body = format!(
            "[{}, {}, {}, {}]",
            entry("ok", 140, "share2", "4"),
            entry("zero", 0, "share2", "4"),
            entry("negative", -5, "share2", "4"),
            entry("legacy", 150, LEGACY_DEVICE, "4")
        );
        let readings = decode_readings(body.as_bytes()).unwrap();

        let ids: Vec<&str> = readings.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ok"]);
        assert!(readings.iter().all(|r| r.value > 0));
    }

    #[test]
    fn test_numeric_type_field_is_accepted() {
        let body = r#"[{"_id": "n", "sgv": 99, "dateString": "2020-12-29T14:54:31.000Z",
            "device": "share2", "type": 1, "sysTime": "2020-12-29T14:54:31.000Z"}]"#;
        let records: Vec<EntryRecord> = decode_records(ENDPOINT, body.as_bytes()).unwrap();
        assert_eq!(records[0].kind.as_string(), "1");
    }

    #[test]
    fn test_loosely_typed_metadata_is_accepted() {
        let body = r#"[{"_id": "m", "sgv": 105, "dateString": "2020-12-29T14:54:31.000Z",
            "trend": 4, "direction": 4, "device": "share2", "type": "sgv", "utcOffset": "0",
            "sysTime": "2020-12-29T14:54:31.000Z", "mills": 1609253671000.0}]"#;
        let readings = decode_readings(body.as_bytes()).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].value, 105);
    }

    #[test]
    fn test_garbage_body_is_an_error_not_empty() {
        let err = decode_readings(b"Unauthorized").unwrap_err();
        assert!(matches!(err, NightscoutError::Decode { .. }));
    }
}
