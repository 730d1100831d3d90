//! Error types for the Nightscout client.
//!
//! | Error | When | Recovery |
//! |-------|------|----------|
//! | [`NightscoutError::InvalidUrl`] / [`NightscoutError::UnsupportedUrl`] | client construction | fix the configured URL |
//! | [`NightscoutError::Transport`] | network failure or timeout | none automatic; the whole operation is aborted |
//! | [`NightscoutError::Status`] | a read endpoint answered with a non-2xx status | check the API secret and URL |
//! | [`NightscoutError::Decode`] | body is not a JSON array | report; the server returned something unexpected |
//! | [`NightscoutError::Encode`] | a notification body could not be serialized | report |
//! | [`NightscoutError::NoDecodableRecords`] | every record in the array was malformed | report |
//!
//! An empty JSON array is never an error: it decodes to an empty `Vec`.

use crate::transport::TransportError;
use thiserror::Error;

/// Errors surfaced by [`crate::client::NightscoutClient`] operations.
#[derive(Error, Debug)]
pub enum NightscoutError {
    /// The base URL could not be parsed.
    #[error("invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL parsed but cannot host API paths.
    #[error("unsupported base URL {0}: expected an http:// or https:// URL")]
    UnsupportedUrl(String),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A read endpoint answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    /// The response body was not a JSON array.
    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A notification body could not be serialized.
    #[error("failed to encode notification body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response held records but none of them could be decoded.
    #[error("{endpoint} returned {count} records and none could be decoded")]
    NoDecodableRecords { endpoint: &'static str, count: usize },
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, NightscoutError>;
