//! Stateless request builder and response classifier for Moodle's REST API.
//!
//! # Design
//! `MoodleRequestBuilder` holds only the credentials. `build_request` turns
//! an operation and its parameters into a GET URL; `parse_response` turns
//! the raw response into a `MoodleResponse` or a `MoodleError`. Neither
//! touches the network or the host, so the whole call shape is testable
//! without I/O.
//!
//! Query layout is `wstoken`, `wsfunction`, `moodlewsrestformat=json`, then
//! the operation's fields as `prefix[field]=value` in table order. Values are
//! percent-encoded with spaces written as `+`; field names keep their
//! literal brackets.

use serde_json::Value;

use crate::config::MoodleConfig;
use crate::error::MoodleError;
use crate::http::{HttpRequest, HttpResponse};
use crate::operation::Operation;
use crate::params::SearchParams;
use crate::types::MoodleResponse;

/// Builds webservice requests and classifies their responses.
#[derive(Debug, Clone)]
pub struct MoodleRequestBuilder {
    config: MoodleConfig,
}

impl MoodleRequestBuilder {
    pub fn new(config: MoodleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MoodleConfig {
        &self.config
    }

    pub fn build_request(&self, operation: &Operation, params: &SearchParams) -> HttpRequest {
        HttpRequest {
            url: format!("{}?{}", self.config.endpoint(), self.build_query(operation, params)),
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }

    /// The encoded query string for `operation`, without the leading `?`.
    pub fn build_query(&self, operation: &Operation, params: &SearchParams) -> String {
        let mut args = vec![
            format!("wstoken={}", encode_value(self.config.token())),
            format!("wsfunction={}", encode_value(operation.wsfunction())),
            "moodlewsrestformat=json".to_string(),
        ];

        let Some(layout) = operation.layout() else {
            return args.join("&");
        };

        for field in layout.fields {
            match params.get(field) {
                Some(value) if layout.skip_empty && !value.is_truthy() => {}
                Some(value) => args.push(format!(
                    "{}[{field}]={}",
                    layout.prefix,
                    encode_value(&value.to_string())
                )),
                None if layout.skip_empty => {}
                None => {
                    tracing::warn!(%operation, field, "required parameter missing, sending empty");
                    args.push(format!("{}[{field}]=", layout.prefix));
                }
            }
        }

        if layout.suspend_flag {
            if let Some(suspend) = params.get("suspend").filter(|v| v.is_truthy()) {
                args.push(format!(
                    "{}[suspend]={}",
                    layout.prefix,
                    encode_value(&suspend.to_string())
                ));
            }
        }

        args.join("&")
    }

    /// Classify a webservice response.
    ///
    /// An `exception` payload wins over the HTTP status so that it is always
    /// reported as `MoodleError::Exception`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<MoodleResponse, MoodleError> {
        let decoded = serde_json::from_str::<Value>(&response.body);

        if let Ok(json) = &decoded {
            if let Some(exception) = non_empty_field(json, "exception") {
                return Err(MoodleError::Exception {
                    exception,
                    errorcode: non_empty_field(json, "errorcode"),
                    message: message_of(json),
                    debuginfo: non_empty_field(json, "debuginfo"),
                    raw: response.body,
                });
            }
        }

        if !response.is_success() {
            return Err(MoodleError::Http {
                status: response.status,
                body: response.body,
            });
        }

        match decoded {
            Ok(json) => Ok(MoodleResponse::new(response.body, json)),
            Err(source) => Err(MoodleError::Decode {
                source,
                raw: response.body,
            }),
        }
    }
}

/// Percent-encode a query value, writing spaces as `+`.
fn encode_value(value: &str) -> String {
    value
        .split(' ')
        .map(|part| urlencoding::encode(part).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}

/// `json["message"]` as text, passed through even when it looks empty.
fn message_of(json: &Value) -> String {
    match json.get("message") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// String form of `json[key]` when it is present and not empty-ish
/// (`null`, `false`, `0`, `""`, `"0"`, `[]`, `{}`).
fn non_empty_field(json: &Value, key: &str) -> Option<String> {
    let value = json.as_object()?.get(key)?;
    match value {
        Value::Null => None,
        Value::Bool(b) => b.then(|| "1".to_string()),
        Value::Number(n) => (n.as_f64() != Some(0.0)).then(|| n.to_string()),
        Value::String(s) if s.is_empty() || s == "0" => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        other => Some(other.to_string()),
    }
}
