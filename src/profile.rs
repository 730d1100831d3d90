//! Therapy profiles (`/api/v1/profile.json`).

use crate::decode::decode_records;
use crate::error::Result;
use serde::Deserialize;

const ENDPOINT: &str = "profile";

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Kept as text; profile start dates use assorted formats.
    pub start_date: String,
    #[serde(default)]
    pub loop_settings: Option<LoopSettings>,
    #[serde(default)]
    pub store: Option<ProfileStore>,
}

impl Profile {
    /// The default basal schedule, if the profile carries one.
    pub fn basal_schedule(&self) -> &[BasalScheduleItem] {
        self.store
            .as_ref()
            .map(|store| store.default_profile.basal.as_slice())
            .unwrap_or(&[])
    }

    /// Look up an override preset by name.
    pub fn override_preset(&self, name: &str) -> Option<&OverridePreset> {
        self.loop_settings
            .as_ref()?
            .override_presets
            .iter()
            .find(|preset| preset.name == name)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopSettings {
    pub maximum_basal_rate_per_hour: f64,
    #[serde(default)]
    pub override_presets: Vec<OverridePreset>,
    /// The override running when the profile was uploaded
    #[serde(default)]
    pub schedule_override: Option<OverridePreset>,
}

/// A named override configured in Loop.
#[derive(Clone, Debug, Deserialize)]
pub struct OverridePreset {
    pub name: String,
    pub symbol: String,
    /// Seconds
    pub duration: i64,
}

impl OverridePreset {
    pub fn duration_seconds(&self) -> i64 {
        self.duration
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration / 60
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProfileStore {
    #[serde(rename = "Default")]
    pub default_profile: StoredProfile,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StoredProfile {
    #[serde(default)]
    pub basal: Vec<BasalScheduleItem>,
}

/// One segment of the basal schedule, starting `time_as_seconds` after
/// midnight.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasalScheduleItem {
    pub time_as_seconds: i64,
    /// Units per hour
    pub value: f64,
}

/// Decode a `profile.json` response body.
pub fn decode_profiles(body: &[u8]) -> Result<Vec<Profile>> {
    decode_records(ENDPOINT, body)
}
