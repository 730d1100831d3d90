//! Device status snapshots (`/api/v1/devicestatus.json`).
//!
//! Loop uploads one status document roughly every five minutes describing
//! the algorithm state (predictions, IOB, COB), the pump, the phone and any
//! active override. Every section is optional because other uploaders
//! (OpenAPS, xDrip) fill in different parts.

use crate::decode::decode_records;
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

const ENDPOINT: &str = "devicestatus";

/// Reservoir readings below this level right after a pump change are not
/// trusted.
const MIN_TRUSTED_RESERVOIR: f32 = 50.0;

#[derive(Clone, Debug, Deserialize)]
pub struct DeviceStatus {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(deserialize_with = "crate::dates::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, rename = "loop")]
    pub loop_status: Option<LoopStatus>,
    #[serde(default)]
    pub pump: Option<PumpStatus>,
    #[serde(default)]
    pub uploader: Option<UploaderStatus>,
    #[serde(default, rename = "override")]
    pub override_status: Option<OverrideStatus>,
}

/// Loop algorithm state at upload time.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopStatus {
    #[serde(deserialize_with = "crate::dates::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub predicted: Option<PredictedGlucose>,
    #[serde(default)]
    pub cob: Option<CarbsOnBoard>,
    #[serde(default)]
    pub iob: Option<InsulinOnBoard>,
    #[serde(default)]
    pub recommended_bolus: Option<f32>,
}

/// Predicted glucose curve, one value per five minutes from `start_date`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedGlucose {
    #[serde(deserialize_with = "crate::dates::deserialize")]
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub values: Option<Vec<f32>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CarbsOnBoard {
    #[serde(deserialize_with = "crate::dates::deserialize")]
    pub timestamp: DateTime<Utc>,
    /// Grams
    pub cob: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InsulinOnBoard {
    #[serde(deserialize_with = "crate::dates::deserialize")]
    pub timestamp: DateTime<Utc>,
    /// Units
    pub iob: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PumpStatus {
    #[serde(deserialize_with = "crate::dates::deserialize")]
    pub clock: DateTime<Utc>,
    /// Units left in the reservoir
    #[serde(default)]
    pub reservoir: Option<f32>,
    pub suspended: bool,
    #[serde(rename = "pumpID")]
    pub pump_id: String,
}

impl PumpStatus {
    /// Reservoir level, corrected for the unreliable readings pumps report
    /// during the first hour after a reservoir change.
    ///
    /// Returns `None` if `pump_change` is after this status was taken or no
    /// reservoir level was reported. A level below 50 U within an hour of
    /// the change is reported as 50 U.
    pub fn valid_reservoir(&self, pump_change: DateTime<Utc>) -> Option<f32> {
        if pump_change > self.clock {
            return None;
        }

        let reservoir = self.reservoir?;
        if reservoir < MIN_TRUSTED_RESERVOIR && self.clock - pump_change < Duration::hours(1) {
            return Some(MIN_TRUSTED_RESERVOIR);
        }

        Some(reservoir)
    }
}

/// The phone running the uploader.
#[derive(Clone, Debug, Deserialize)]
pub struct UploaderStatus {
    #[serde(deserialize_with = "crate::dates::deserialize")]
    pub timestamp: DateTime<Utc>,
    /// Percent
    pub battery: i32,
    pub name: String,
}

/// The override active at upload time, if any.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideStatus {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(deserialize_with = "crate::dates::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub active: bool,
    #[serde(default)]
    pub multiplier: Option<f32>,
    #[serde(default)]
    pub current_correction_range: Option<CorrectionRange>,
}

/// Glucose target range in mg/dL.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRange {
    pub min_value: i32,
    pub max_value: i32,
}

/// Decode a `devicestatus.json` response body.
pub fn decode_device_statuses(body: &[u8]) -> Result<Vec<DeviceStatus>> {
    decode_records(ENDPOINT, body)
}
