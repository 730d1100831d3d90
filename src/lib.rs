//! # Nightscout Client Core Library
//!
//! This library talks to a [Nightscout](https://github.com/nightscout/cgm-remote-monitor)
//! site, the open-source remote monitor for continuous glucose monitoring (CGM)
//! data. It reads glucose readings, treatments, device status snapshots and
//! therapy profiles, and posts Loop notifications (overrides, remote bolus and
//! remote carbs).
//!
//! ## Design Philosophy
//!
//! ### Tolerant Decoding
//! Nightscout collections are filled by many uploaders and firmware versions.
//! - **Polymorphic fields**: values such as the glucose trend arrive as a number,
//!   a text label or not at all; see [`value::AnyValue`] and [`trend`]
//! - **Two timestamp formats**: with and without milliseconds; see [`dates`]
//! - **Per-record isolation**: one malformed record is skipped, not fatal; see
//!   [`decode`]
//!
//! ### Bounded Queries
//! Glucose queries are split into windows of at most seven days and fetched
//! one after another ([`window`]), so arbitrarily long ranges can be read from
//! servers that refuse wide queries.
//!
//! ### Data Flow
//! 1. **Plan**: split `[start, end]` into windows
//! 2. **Fetch**: one authenticated GET per window through a [`transport::Transport`]
//! 3. **Decode**: JSON array → intermediate records → typed values
//! 4. **Classify**: treatments are partitioned into basal, bolus and carb entries
//!
//! ## Core Types
//!
//! The library root exports the typed values callers work with:
//! - [`GlucoseReading`]: a single CGM reading (EGV)
//! - [`BasalEntry`], [`BolusEntry`], [`CarbEntry`]: classified treatments
//!
//! The entry point is [`client::NightscoutClient`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// Module declarations
pub mod client;
pub mod config;
pub mod dates;
pub mod decode;
pub mod device_status;
pub mod entries;
pub mod error;
pub mod profile;
pub mod renderer;
pub mod transport;
pub mod treatments;
pub mod trend;
pub mod value;
pub mod window;

#[cfg(test)]
mod tests;

pub use client::NightscoutClient;
pub use error::{NightscoutError, Result};
pub use treatments::TreatmentResult;

/// A single estimated glucose value (EGV).
///
/// Readings are only ever constructed from server data that passed the
/// sensor-error filter, so `value` is always positive.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use nightscout_client::GlucoseReading;
///
/// let at = Utc.with_ymd_and_hms(2020, 12, 29, 14, 54, 31).unwrap();
/// let reading = GlucoseReading {
///     id: "5feb436be0d1aa28f0556ec5".to_string(),
///     value: 119,
///     system_time: at,
///     display_time: at,
///     realtime_value: None,
///     smoothed_value: None,
///     trend_rate: 2.0,
///     trend_description: String::new(),
/// };
///
/// assert_eq!(reading.to_string(), "2020-12-29 14:54:31 UTC: 119, ( 2.0)");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlucoseReading {
    /// Server-side record identifier (`_id`)
    pub id: String,
    /// Glucose in mg/dL
    pub value: i32,
    /// Time the sensor produced the value
    pub system_time: DateTime<Utc>,
    /// Time shown to the user
    pub display_time: DateTime<Utc>,
    pub realtime_value: Option<i32>,
    pub smoothed_value: Option<i32>,
    /// Canonical trend code, see [`trend`]
    pub trend_rate: f32,
    pub trend_description: String,
}

impl fmt::Display for GlucoseReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}, ({} {:?})",
            self.display_time, self.value, self.trend_description, self.trend_rate
        )
    }
}

/// A temporary basal rate change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasalEntry {
    pub date: DateTime<Utc>,
    /// Minutes
    pub duration: f32,
    /// Units per hour
    pub rate: f32,
    /// Units delivered
    pub amount: f32,
}

/// An insulin bolus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BolusEntry {
    pub date: DateTime<Utc>,
    /// Units of insulin
    pub amount: f32,
}

/// A logged carbohydrate intake.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CarbEntry {
    pub date: DateTime<Utc>,
    /// Grams
    pub amount: i32,
}

/// Estimate HbA1c (%) from the mean of a set of readings.
///
/// Uses the ADAG regression `A1C = (46.7 + mean mg/dL) / 28.7`. Returns
/// `None` for an empty slice.
pub fn estimated_a1c(readings: &[GlucoseReading]) -> Option<f32> {
    if readings.is_empty() {
        return None;
    }

    let total: f32 = readings.iter().map(|r| r.value as f32).sum();
    let average = total / readings.len() as f32;
    Some((46.7 + average) / 28.7)
}
