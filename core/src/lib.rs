//! Moodle REST webservice adapter for a CRM host.
//!
//! # Overview
//! Builds `webservice/rest/server.php` GET requests for user lookup,
//! creation and update, course listing, enrolment, suspension and
//! unenrolment, then classifies the JSON response. Remote `exception`
//! payloads are reported to the host's system log.
//!
//! # Design
//! - `MoodleRequestBuilder` is pure: `build_request` produces an
//!   `HttpRequest`, `parse_response` consumes an `HttpResponse`. A host that
//!   does its own I/O can use it directly.
//! - `MoodleClient` adds a blocking `Transport` (ureq by default) and a
//!   `CrmHost` for the actor id and system log.
//! - Credentials come from a `SettingsStore` once, at construction, and are
//!   passed in explicitly rather than held in a global.

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod http;
pub mod operation;
pub mod params;
pub mod transport;
pub mod types;

pub use builder::MoodleRequestBuilder;
pub use client::MoodleClient;
pub use config::{EnvSettings, MapSettings, MoodleConfig, SettingsStore};
pub use error::{ConfigError, MoodleError, TransportError};
pub use host::{CrmHost, LogLevel, RecordingHost, SystemLogRecord, TracingHost};
pub use http::{HttpRequest, HttpResponse};
pub use operation::{ArgumentLayout, Operation};
pub use params::{ParamValue, SearchParams};
pub use transport::{Transport, UreqTransport};
pub use types::{Course, CreatedUser, MoodleResponse, MoodleUser, UserSearch, Warning};
