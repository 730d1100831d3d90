//! # Nightscout API Client
//!
//! [`NightscoutClient`] is the entry point of the crate. It owns the base URL
//! and the API secret digest and exposes one method per remote operation.
//!
//! ## Endpoints
//!
//! | Method | Endpoint |
//! |--------|----------|
//! | [`fetch_glucose_readings`](NightscoutClient::fetch_glucose_readings) | `GET /api/v1/entries/sgv.json` (windowed) |
//! | [`fetch_treatments`](NightscoutClient::fetch_treatments) | `GET /api/v1/treatments.json` |
//! | [`fetch_device_statuses`](NightscoutClient::fetch_device_statuses) | `GET /api/v1/devicestatus.json` |
//! | [`fetch_profiles`](NightscoutClient::fetch_profiles) | `GET /api/v1/profile.json` |
//! | [`start_override`](NightscoutClient::start_override), [`cancel_override`](NightscoutClient::cancel_override), [`deliver_bolus`](NightscoutClient::deliver_bolus), [`deliver_carbs`](NightscoutClient::deliver_carbs) | `POST /api/v2/notifications/loop` |
//!
//! ## Authentication
//!
//! Every request carries an `api-secret` header holding the lowercase hex
//! SHA-1 digest of the configured secret, which is what Nightscout compares
//! against its `API_SECRET`.
//!
//! ## Errors
//!
//! Read operations return either the complete result or an error; a failure
//! in any window of a paginated query aborts the whole call. Notification
//! operations return the raw [`HttpResponse`] and leave status checking to
//! the caller, since Loop's notification endpoint reports problems in the
//! response body.
//!
//! # Example
//! ```no_run
//! use chrono::{Duration, Utc};
//! use nightscout_client::NightscoutClient;
//!
//! # async fn example() -> nightscout_client::Result<()> {
//! let client = NightscoutClient::new("https://my-site.herokuapp.com", "my-api-secret")?;
//!
//! let readings = client
//!     .fetch_glucose_readings(Utc::now() - Duration::days(30), None)
//!     .await?;
//! println!("{} readings", readings.len());
//! # Ok(())
//! # }
//! ```

use crate::config::{Config, QueryConfig};
use crate::dates::format_timestamp;
use crate::device_status::{decode_device_statuses, DeviceStatus};
use crate::entries::decode_readings;
use crate::error::{NightscoutError, Result};
use crate::profile::{decode_profiles, Profile};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::treatments::{decode_treatments, TreatmentResult};
use crate::window::{dedupe_by_id, fetch_windows, plan_windows};
use crate::{BasalEntry, BolusEntry, CarbEntry, GlucoseReading};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha1::{Digest, Sha1};
use tracing::{debug, info, trace};
use url::Url;

const ENTRIES_PATH: &str = "/api/v1/entries/sgv.json";
const TREATMENTS_PATH: &str = "/api/v1/treatments.json";
const DEVICE_STATUS_PATH: &str = "/api/v1/devicestatus.json";
const PROFILE_PATH: &str = "/api/v1/profile.json";
const NOTIFICATIONS_PATH: &str = "/api/v2/notifications/loop";

const API_SECRET_HEADER: &str = "api-secret";

/// Lowercase hex SHA-1 of `secret`, as expected in the `api-secret` header.
pub fn api_secret_digest(secret: &str) -> String {
    hex::encode(Sha1::digest(secret.as_bytes()))
}

/// Client for one Nightscout site.
///
/// Holds no mutable state, so one instance can serve concurrent calls as
/// long as the transport allows it.
pub struct NightscoutClient<T: Transport = ReqwestTransport> {
    base_url: Url,
    secret_digest: String,
    query: QueryConfig,
    transport: T,
    now: fn() -> DateTime<Utc>,
}

impl NightscoutClient<ReqwestTransport> {
    /// Create a client with default query limits and a 60 second timeout.
    pub fn new(base_url: &str, secret: &str) -> Result<Self> {
        Self::with_query_config(base_url, secret, QueryConfig::default())
    }

    /// Create a client with explicit query limits.
    pub fn with_query_config(base_url: &str, secret: &str, query: QueryConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(query.request_timeout())?;
        Self::with_transport(base_url, secret, query, transport)
    }

    /// Create a client from a loaded [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_query_config(
            &config.server.url,
            &config.server.secret,
            config.query.clone(),
        )
    }
}

impl<T: Transport> NightscoutClient<T> {
    /// Create a client over a custom transport.
    ///
    /// Fails if `base_url` does not parse or is not an http(s) URL.
    pub fn with_transport(
        base_url: &str,
        secret: &str,
        query: QueryConfig,
        transport: T,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(NightscoutError::UnsupportedUrl(base_url.to_string()));
        }

        Ok(Self {
            base_url,
            secret_digest: api_secret_digest(secret),
            query,
            transport,
            now: Utc::now,
        })
    }

    /// Replace the clock used when a query's end date is omitted.
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn query_config(&self) -> &QueryConfig {
        &self.query
    }

    /// The value sent in the `api-secret` header.
    pub fn api_secret_digest(&self) -> &str {
        &self.secret_digest
    }

    // -- Reads --

    /// Fetch glucose readings in `[start, end]`, `end` defaulting to now.
    ///
    /// The range is split into windows of at most
    /// [`QueryConfig::max_window_days`] and fetched sequentially. Readings are
    /// returned in window order, then in server order. A reading at a window
    /// boundary may appear twice unless
    /// [`QueryConfig::dedupe_boundary_readings`] is set.
    pub async fn fetch_glucose_readings(
        &self,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<GlucoseReading>> {
        let end = end.unwrap_or_else(self.now);
        let windows = plan_windows(start, end, self.query.max_window());
        debug!(windows = windows.len(), %start, %end, "planned glucose query");

        let readings = fetch_windows(&windows, |window| async move {
            let url = self.range_url(
                ENTRIES_PATH,
                "dateString",
                window.start,
                window.end,
                self.query.entries_count,
            );
            let response = self.get("entries", url).await?;
            decode_readings(&response.body)
        })
        .await?;

        let readings = if self.query.dedupe_boundary_readings {
            dedupe_by_id(readings, |reading| reading.id.clone())
        } else {
            readings
        };

        info!(count = readings.len(), "fetched glucose readings");
        Ok(readings)
    }

    /// Fetch treatments in `[start, end]` and classify them.
    pub async fn fetch_treatments(
        &self,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<TreatmentResult> {
        let end = end.unwrap_or_else(self.now);
        let url = self.range_url(
            TREATMENTS_PATH,
            "created_at",
            start,
            end,
            self.query.treatments_count,
        );
        let response = self.get("treatments", url).await?;
        let result = decode_treatments(&response.body)?;

        info!(
            basal = result.basal_entries.len(),
            bolus = result.bolus_entries.len(),
            carbs = result.carb_entries.len(),
            "fetched treatments"
        );
        Ok(result)
    }

    pub async fn fetch_basal_treatments(
        &self,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<BasalEntry>> {
        Ok(self.fetch_treatments(start, end).await?.basal_entries)
    }

    pub async fn fetch_bolus_treatments(
        &self,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<BolusEntry>> {
        Ok(self.fetch_treatments(start, end).await?.bolus_entries)
    }

    pub async fn fetch_carb_treatments(
        &self,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<CarbEntry>> {
        Ok(self.fetch_treatments(start, end).await?.carb_entries)
    }

    /// Fetch device status snapshots in `[start, end]`.
    pub async fn fetch_device_statuses(
        &self,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<DeviceStatus>> {
        let end = end.unwrap_or_else(self.now);
        let url = self.range_url(
            DEVICE_STATUS_PATH,
            "created_at",
            start,
            end,
            self.query.device_status_count,
        );
        let response = self.get("devicestatus", url).await?;
        let statuses = decode_device_statuses(&response.body)?;

        info!(count = statuses.len(), "fetched device statuses");
        Ok(statuses)
    }

    /// Fetch all stored profiles.
    pub async fn fetch_profiles(&self) -> Result<Vec<Profile>> {
        let url = self.endpoint_url(PROFILE_PATH);
        let response = self.get("profile", url).await?;
        let profiles = decode_profiles(&response.body)?;

        info!(count = profiles.len(), "fetched profiles");
        Ok(profiles)
    }

    // -- Loop notifications --

    /// Ask Loop to enable the named override preset.
    pub async fn start_override(
        &self,
        name: &str,
        display: &str,
        duration_minutes: i64,
    ) -> Result<HttpResponse> {
        let duration = duration_minutes.to_string();
        self.notify(&StartOverride {
            reason: name,
            reason_display: display,
            event_type: "Temporary Override",
            duration: &duration,
            notes: "",
        })
        .await
    }

    /// Ask Loop to cancel the active override.
    pub async fn cancel_override(&self) -> Result<HttpResponse> {
        self.notify(&CancelOverride {
            event_type: "Temporary Override Cancel",
            duration: "0",
        })
        .await
    }

    /// Ask Loop to deliver a bolus. `otp` is the current one-time password.
    pub async fn deliver_bolus(&self, amount_units: f64, otp: u32) -> Result<HttpResponse> {
        self.notify(&RemoteBolus {
            event_type: "Remote Bolus Entry",
            remote_bolus: format!("{amount_units:?}"),
            otp: otp.to_string(),
        })
        .await
    }

    /// Ask Loop to record a carb entry absorbed over `absorption_hours`.
    pub async fn deliver_carbs(
        &self,
        amount_grams: i32,
        absorption_hours: f32,
        otp: u32,
    ) -> Result<HttpResponse> {
        self.notify(&RemoteCarbs {
            event_type: "Remote Carbs Entry",
            remote_carbs: amount_grams.to_string(),
            remote_absorption: format!("{absorption_hours:?}"),
            otp: otp.to_string(),
        })
        .await
    }

    // -- Private Implementation --

    /// Base URL with its path replaced by `path`.
    fn endpoint_url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url.set_query(None);
        url
    }

    /// Endpoint URL filtered to `[start, end]` on `field`.
    fn range_url(
        &self,
        path: &str,
        field: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        count: u32,
    ) -> Url {
        let mut url = self.endpoint_url(path);
        url.query_pairs_mut()
            .append_pair(&format!("find[{field}][$gte]"), &format_timestamp(&start))
            .append_pair(&format!("find[{field}][$lte]"), &format_timestamp(&end))
            .append_pair("count", &count.to_string());
        url
    }

    async fn get(&self, endpoint: &'static str, url: Url) -> Result<HttpResponse> {
        let request = HttpRequest::get(url).header(API_SECRET_HEADER, &self.secret_digest);
        trace!(curl = %request.to_curl(), "sending request");

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(NightscoutError::Status {
                endpoint,
                status: response.status,
                body: response.text(),
            });
        }
        Ok(response)
    }

    async fn notify<B: Serialize>(&self, payload: &B) -> Result<HttpResponse> {
        let body = serde_json::to_vec(payload).map_err(NightscoutError::Encode)?;
        let request = HttpRequest::post(self.endpoint_url(NOTIFICATIONS_PATH), body)
            .header("Content-Type", "application/json")
            .header(API_SECRET_HEADER, &self.secret_digest);
        trace!(curl = %request.to_curl(), "sending notification");

        let response = self.transport.execute(request).await?;
        debug!(status = response.status, "notification sent");
        Ok(response)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartOverride<'a> {
    reason: &'a str,
    reason_display: &'a str,
    event_type: &'a str,
    duration: &'a str,
    notes: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CancelOverride<'a> {
    event_type: &'a str,
    duration: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoteBolus<'a> {
    event_type: &'a str,
    remote_bolus: String,
    otp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoteCarbs<'a> {
    event_type: &'a str,
    remote_carbs: String,
    remote_absorption: String,
    otp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_secret_digest() {
        // sha1("abc") from FIPS 180-1
        assert_eq!(
            api_secret_digest("abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(api_secret_digest("abc").len(), 40);
    }

    #[test]
    fn test_rejects_bad_base_urls() {
        let query = QueryConfig::default();
        let transport = || ReqwestTransport::with_client(reqwest::Client::new());

        let err = NightscoutClient::with_transport("not a url", "s", query.clone(), transport())
            .err()
            .unwrap();
        assert!(matches!(err, NightscoutError::InvalidUrl(_)));

        let err = NightscoutClient::with_transport("ftp://example.com", "s", query.clone(), transport())
            .err()
            .unwrap();
        assert!(matches!(err, NightscoutError::UnsupportedUrl(_)));
    }

    #[test]
    fn test_endpoint_url_replaces_path() {
        let client = NightscoutClient::with_transport(
            "https://example.herokuapp.com/some/path?x=1",
            "secret",
            QueryConfig::default(),
            ReqwestTransport::with_client(reqwest::Client::new()),
        )
        .unwrap();

        assert_eq!(
            client.endpoint_url(PROFILE_PATH).as_str(),
            "https://example.herokuapp.com/api/v1/profile.json"
        );
    }
}
