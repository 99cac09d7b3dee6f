//! Blocking Moodle webservice client.
//!
//! `MoodleClient` owns its credentials, a `Transport` and a `CrmHost`. Each
//! `send` builds the request, performs one GET, classifies the response and,
//! when Moodle reports an exception, writes exactly one error record to the
//! host's system log. Errors are returned, never raised further.

use crate::builder::MoodleRequestBuilder;
use crate::config::{MoodleConfig, SettingsStore};
use crate::error::{ConfigError, MoodleError};
use crate::host::{CrmHost, LogLevel, SystemLogRecord, TracingHost};
use crate::operation::Operation;
use crate::params::SearchParams;
use crate::transport::{Transport, UreqTransport};
use crate::types::MoodleResponse;

pub struct MoodleClient<T = UreqTransport, H = TracingHost> {
    builder: MoodleRequestBuilder,
    transport: T,
    host: H,
}

impl MoodleClient {
    /// Client reading credentials from `settings`, sending with `ureq` and
    /// logging exceptions through `tracing`.
    pub fn from_settings(settings: &dyn SettingsStore) -> Result<Self, ConfigError> {
        let config = MoodleConfig::from_settings(settings)?;
        Ok(Self::new(config, UreqTransport::new(), TracingHost::default()))
    }
}

impl<T: Transport, H: CrmHost> MoodleClient<T, H> {
    pub fn new(config: MoodleConfig, transport: T, host: H) -> Self {
        Self {
            builder: MoodleRequestBuilder::new(config),
            transport,
            host,
        }
    }

    pub fn builder(&self) -> &MoodleRequestBuilder {
        &self.builder
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn send(&self, operation: &Operation, params: &SearchParams) -> Result<MoodleResponse, MoodleError> {
        let request = self.builder.build_request(operation, params);
        tracing::debug!(wsfunction = operation.wsfunction(), "sending moodle request");

        let result = self
            .transport
            .execute(&request)
            .map_err(MoodleError::from)
            .and_then(|response| self.builder.parse_response(response));

        if let Err(err) = &result {
            self.record_error(operation, err);
        }
        result
    }

    /// `core_user_get_users` with `key` / `value` criteria.
    pub fn get_user(&self, params: &SearchParams) -> Result<MoodleResponse, MoodleError> {
        self.send(&Operation::GetUser, params)
    }

    pub fn create_user(&self, params: &SearchParams) -> Result<MoodleResponse, MoodleError> {
        self.send(&Operation::CreateUser, params)
    }

    pub fn update_user(&self, params: &SearchParams) -> Result<MoodleResponse, MoodleError> {
        self.send(&Operation::UpdateUser, params)
    }

    pub fn get_courses(&self) -> Result<MoodleResponse, MoodleError> {
        self.send(&Operation::GetCourses, &SearchParams::new())
    }

    pub fn enroll_user(&self, params: &SearchParams) -> Result<MoodleResponse, MoodleError> {
        self.send(&Operation::EnrollUser, params)
    }

    /// Re-enrols with `suspend` set, keeping the enrolment but making it inactive.
    pub fn suspend_enrolment(&self, params: &SearchParams) -> Result<MoodleResponse, MoodleError> {
        self.send(&Operation::SuspendEnrolment, params)
    }

    pub fn unenroll_user(&self, params: &SearchParams) -> Result<MoodleResponse, MoodleError> {
        self.send(&Operation::UnenrollUser, params)
    }

    fn record_error(&self, operation: &Operation, err: &MoodleError) {
        match err {
            MoodleError::Exception { message, .. } => {
                self.host.create_system_log(SystemLogRecord {
                    level: LogLevel::Error,
                    message: message.clone(),
                    contact_id: self.host.logged_in_contact_id(),
                });
            }
            MoodleError::Http { status, .. } => {
                tracing::warn!(wsfunction = operation.wsfunction(), status, "moodle request failed");
            }
            other => {
                tracing::warn!(wsfunction = operation.wsfunction(), error = %other, "moodle request failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::TransportError;
    use crate::host::RecordingHost;
    use crate::http::{HttpRequest, HttpResponse};

    /// Replays a canned body and remembers the URLs it was asked for.
    struct CannedTransport {
        body: Result<String, String>,
        urls: RefCell<Vec<String>>,
    }

    impl CannedTransport {
        fn ok(body: &str) -> Self {
            Self {
                body: Ok(body.to_string()),
                urls: RefCell::new(Vec::new()),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                body: Err(reason.to_string()),
                urls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for CannedTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.urls.borrow_mut().push(request.url.clone());
            match &self.body {
                Ok(body) => Ok(HttpResponse::ok(body.clone())),
                Err(reason) => Err(TransportError(reason.clone())),
            }
        }
    }

    fn client(transport: CannedTransport) -> MoodleClient<CannedTransport, RecordingHost> {
        MoodleClient::new(
            MoodleConfig::new("tok", "http://m.test"),
            transport,
            RecordingHost::new(Some(42)),
        )
    }

    #[test]
    fn exception_is_returned_and_logged_once() {
        let client = client(CannedTransport::ok(
            r#"{"exception":"moodle_exception","message":"bad token"}"#,
        ));
        let err = client.get_user(&SearchParams::new()).unwrap_err();
        assert!(err.is_exception());

        let records = client.host().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, LogLevel::Error);
        assert_eq!(records[0].message, "bad token");
        assert_eq!(records[0].contact_id, Some(42));
    }

    #[test]
    fn success_writes_no_log() {
        let client = client(CannedTransport::ok(r#"{"id":5}"#));
        let response = client.update_user(&SearchParams::new().with("id", 5)).unwrap();
        assert_eq!(response.json()["id"], 5);
        assert!(client.host().records().is_empty());
    }

    #[test]
    fn malformed_json_is_error_without_log() {
        let client = client(CannedTransport::ok("not json"));
        let err = client.get_courses().unwrap_err();
        assert!(matches!(err, MoodleError::Decode { .. }));
        assert!(client.host().records().is_empty());
    }

    #[test]
    fn transport_failure_is_error_without_log() {
        let client = client(CannedTransport::failing("connection refused"));
        let err = client.enroll_user(&SearchParams::new()).unwrap_err();
        assert!(matches!(err, MoodleError::Transport(_)));
        assert!(err.raw_body().is_none());
        assert!(client.host().records().is_empty());
    }

    #[test]
    fn named_methods_hit_their_functions() {
        let client = client(CannedTransport::ok("null"));
        let params = SearchParams::new();
        client.get_user(&params).unwrap();
        client.create_user(&params).unwrap();
        client.update_user(&params).unwrap();
        client.get_courses().unwrap();
        client.enroll_user(&params).unwrap();
        client.suspend_enrolment(&params).unwrap();
        client.unenroll_user(&params).unwrap();

        let functions: Vec<String> = client
            .transport
            .urls
            .borrow()
            .iter()
            .map(|url| {
                url.split('&')
                    .find_map(|arg| arg.strip_prefix("wsfunction="))
                    .unwrap()
                    .to_string()
            })
            .collect();
        assert_eq!(
            functions,
            vec![
                "core_user_get_users",
                "core_user_create_users",
                "core_user_update_users",
                "core_course_get_courses",
                "enrol_manual_enrol_users",
                "enrol_manual_enrol_users",
                "enrol_manual_unenrol_users",
            ]
        );
    }

    #[test]
    fn from_settings_requires_credentials() {
        let settings = crate::config::MapSettings::new();
        assert!(MoodleClient::from_settings(&settings).is_err());
    }
}
