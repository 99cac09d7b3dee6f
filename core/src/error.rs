//! Error types for the Moodle webservice adapter.
//!
//! # Design
//! Moodle reports application errors inside HTTP 200 responses through an
//! `exception` field; those land in `Exception` and are the only variant the
//! client writes to the host log. Transport failures, non-2xx statuses and
//! bodies that are not JSON each get their own variant so callers never
//! mistake them for success.

use thiserror::Error;

/// Errors returned by `MoodleClient::send` and `MoodleRequestBuilder::parse_response`.
#[derive(Debug, Error)]
pub enum MoodleError {
    /// The webservice answered with an `exception` payload.
    #[error("moodle {exception}: {message}")]
    Exception {
        exception: String,
        errorcode: Option<String>,
        message: String,
        debuginfo: Option<String>,
        raw: String,
    },

    /// The server returned a non-2xx status. The body is kept out of the
    /// message; read it with `raw_body`.
    #[error("HTTP {status}")]
    Http { status: u16, body: String },

    /// The response body is not valid JSON.
    #[error("response is not valid JSON: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        raw: String,
    },

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl MoodleError {
    /// True for remote `exception` payloads, the condition the host logs.
    pub fn is_exception(&self) -> bool {
        matches!(self, MoodleError::Exception { .. })
    }

    /// The response body, when one was received.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            MoodleError::Exception { raw, .. } | MoodleError::Decode { raw, .. } => Some(raw),
            MoodleError::Http { body, .. } => Some(body),
            MoodleError::Transport(_) => None,
        }
    }
}

/// Failure to complete an HTTP round-trip.
#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Errors building a `MoodleConfig` from host settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing setting: {0}")]
    MissingSetting(&'static str),

    #[error("env file: {0}")]
    EnvFile(String),
}
