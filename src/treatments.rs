//! # Treatment Classification
//!
//! `/api/v1/treatments.json` returns one heterogeneous stream of care events.
//! Three kinds matter to glucose analysis and are pulled out here:
//!
//! | `eventType`        | becomes        | notes |
//! |--------------------|----------------|-------|
//! | `Temp Basal`       | [`BasalEntry`] | duration, rate and amount default to 0 |
//! | `Correction Bolus` | [`BolusEntry`] | only when `insulin` is present |
//! | `Carb Correction`  | [`CarbEntry`]  | carbs default to 0 |
//!
//! Rules are checked in that order and the first match wins, so a record
//! lands in at most one stream. Everything else (site changes, notes, a
//! `Correction Bolus` without insulin, ...) is dropped.
//!
//! Loop writes automatic and manual boluses as `Correction Bolus` with the
//! dose in `insulin`, and meal entries as `Carb Correction`. The entry time is
//! `created_at`, which for carbs is the time of eating rather than the time
//! the entry was typed in.
//!
//! Numeric fields go through [`AnyValue`] because some uploaders send them as
//! strings.

use crate::decode::decode_records;
use crate::error::Result;
use crate::value::AnyValue;
use crate::{BasalEntry, BolusEntry, CarbEntry};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const TEMP_BASAL: &str = "Temp Basal";
pub const CORRECTION_BOLUS: &str = "Correction Bolus";
pub const CARB_CORRECTION: &str = "Carb Correction";

const ENDPOINT: &str = "treatments";

/// A treatment as stored by Nightscout.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRecord {
    #[serde(rename = "_id")]
    pub id: String,
    /// Uploader's own timestamp: text from Loop (`2020-12-14T04:15:02Z`),
    /// epoch milliseconds from some other uploaders
    #[serde(default)]
    pub timestamp: Option<AnyValue>,
    pub event_type: String,
    #[serde(rename = "created_at", deserialize_with = "crate::dates::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub entered_by: Option<AnyValue>,
    /// `"absolute"` or `"percent"` for temp basals
    #[serde(default)]
    pub temp: Option<AnyValue>,
    #[serde(default)]
    pub amount: Option<AnyValue>,
    #[serde(default)]
    pub rate: Option<AnyValue>,
    #[serde(default)]
    pub absolute: Option<AnyValue>,
    /// Minutes
    #[serde(default)]
    pub duration: Option<AnyValue>,
    #[serde(default)]
    pub carbs: Option<AnyValue>,
    #[serde(default)]
    pub insulin: Option<AnyValue>,
    #[serde(default)]
    pub utc_offset: Option<AnyValue>,
    #[serde(default)]
    pub mills: Option<AnyValue>,
}

/// A treatment after classification.
#[derive(Clone, Debug, PartialEq)]
pub enum Treatment {
    Basal(BasalEntry),
    Bolus(BolusEntry),
    Carb(CarbEntry),
}

/// Present and not JSON null.
fn present(value: &Option<AnyValue>) -> Option<&AnyValue> {
    value.as_ref().filter(|v| **v != AnyValue::Null)
}

fn float_or_zero(value: &Option<AnyValue>) -> f32 {
    present(value).map(AnyValue::as_float).unwrap_or(0.0)
}

impl TreatmentRecord {
    pub fn basal_entry(&self) -> Option<BasalEntry> {
        if self.event_type != TEMP_BASAL {
            return None;
        }

        Some(BasalEntry {
            date: self.created_at,
            duration: float_or_zero(&self.duration),
            rate: float_or_zero(&self.rate),
            amount: float_or_zero(&self.amount),
        })
    }

    pub fn bolus_entry(&self) -> Option<BolusEntry> {
        if self.event_type != CORRECTION_BOLUS {
            return None;
        }

        let insulin = present(&self.insulin)?;
        Some(BolusEntry {
            date: self.created_at,
            amount: insulin.as_float(),
        })
    }

    pub fn carb_entry(&self) -> Option<CarbEntry> {
        if self.event_type != CARB_CORRECTION {
            return None;
        }

        let grams = present(&self.carbs).map(AnyValue::as_int).unwrap_or(0);
        Some(CarbEntry {
            date: self.created_at,
            amount: i32::try_from(grams).unwrap_or(0),
        })
    }

    /// Classify this record, first matching rule wins.
    ///
    /// A `Correction Bolus` without insulin returns `None`; it is never
    /// retried against the carb rule because the event types differ.
    pub fn classify(&self) -> Option<Treatment> {
        if let Some(basal) = self.basal_entry() {
            return Some(Treatment::Basal(basal));
        }
        if let Some(bolus) = self.bolus_entry() {
            return Some(Treatment::Bolus(bolus));
        }
        self.carb_entry().map(Treatment::Carb)
    }
}

/// Treatments partitioned by kind, each in response order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreatmentResult {
    pub basal_entries: Vec<BasalEntry>,
    pub bolus_entries: Vec<BolusEntry>,
    pub carb_entries: Vec<CarbEntry>,
}

impl TreatmentResult {
    /// Partition `records`; unmatched records are dropped.
    pub fn from_records(records: &[TreatmentRecord]) -> Self {
        let mut result = TreatmentResult::default();

        for record in records {
            match record.classify() {
                Some(Treatment::Basal(entry)) => result.basal_entries.push(entry),
                Some(Treatment::Bolus(entry)) => result.bolus_entries.push(entry),
                Some(Treatment::Carb(entry)) => result.carb_entries.push(entry),
                None => {}
            }
        }

        result
    }

    /// Number of classified entries across all three streams.
    pub fn len(&self) -> usize {
        self.basal_entries.len() + self.bolus_entries.len() + self.carb_entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bolus insulin in units.
    pub fn total_bolus_units(&self) -> f32 {
        self.bolus_entries.iter().map(|b| b.amount).sum()
    }

    /// Total carbohydrates in grams.
    pub fn total_carbs(&self) -> i32 {
        self.carb_entries.iter().map(|c| c.amount).sum()
    }
}

/// Decode a `treatments.json` response body and classify it.
pub fn decode_treatments(body: &[u8]) -> Result<TreatmentResult> {
    let records: Vec<TreatmentRecord> = decode_records(ENDPOINT, body)?;
    Ok(TreatmentResult::from_records(&records))
}
