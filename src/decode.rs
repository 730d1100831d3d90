//! Tolerant decoding of Nightscout JSON arrays.
//!
//! Nightscout collections are written by many uploaders, so a single bad
//! record should not hide the rest of a response. The body must be a JSON
//! array; each element is decoded on its own and elements that fail are
//! skipped with a warning. If the array had records and not one of them
//! decoded, the response is treated as malformed.

use crate::error::{NightscoutError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Decode `body` as a JSON array of `T`.
pub fn decode_records<T: DeserializeOwned>(endpoint: &'static str, body: &[u8]) -> Result<Vec<T>> {
    let elements: Vec<Value> = serde_json::from_slice(body)
        .map_err(|source| NightscoutError::Decode { endpoint, source })?;

    let total = elements.len();
    let mut records = Vec::with_capacity(total);

    for (index, element) in elements.into_iter().enumerate() {
        match serde_json::from_value::<T>(element) {
            Ok(record) => records.push(record),
            Err(err) => warn!(endpoint, index, error = %err, "skipping malformed record"),
        }
    }

    if total > 0 && records.is_empty() {
        return Err(NightscoutError::NoDecodableRecords {
            endpoint,
            count: total,
        });
    }

    debug!(endpoint, decoded = records.len(), total, "decoded response");
    Ok(records)
}
