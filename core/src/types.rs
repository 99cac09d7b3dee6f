//! Decoded webservice responses and typed views over common payloads.
//!
//! # Design
//! `MoodleResponse` always carries the raw body alongside the decoded JSON,
//! and the adapter never checks a payload's shape beyond the `exception`
//! field. The DTOs below are opt-in: callers that want typed access call
//! `MoodleResponse::decode`. Fields Moodle may omit are `Option` or
//! `#[serde(default)]`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MoodleError;

/// A successful (non-exception) webservice response.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodleResponse {
    raw: String,
    json: Value,
}

impl MoodleResponse {
    pub(crate) fn new(raw: String, json: Value) -> Self {
        Self { raw, json }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn json(&self) -> &Value {
        &self.json
    }

    pub fn into_json(self) -> Value {
        self.json
    }

    /// Deserialize the payload into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, MoodleError> {
        T::deserialize(&self.json).map_err(|source| MoodleError::Decode {
            source,
            raw: self.raw.clone(),
        })
    }
}

/// A user record as returned by `core_user_get_users`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodleUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended: Option<bool>,
}

/// Non-fatal warning attached to some responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Warning {
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub itemid: Option<i64>,
    pub warningcode: String,
    pub message: String,
}

/// Payload of `core_user_get_users`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSearch {
    pub users: Vec<MoodleUser>,
    #[serde(default)]
    pub warnings: Vec<Warning>,
}

/// One element of the `core_user_create_users` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedUser {
    pub id: i64,
    pub username: String,
}

/// One element of the `core_course_get_courses` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    pub id: i64,
    pub shortname: String,
    pub fullname: String,
    #[serde(default)]
    pub categoryid: Option<i64>,
    #[serde(default)]
    pub visible: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_user_search() {
        let raw = r#"{"users":[{"id":5,"username":"ada","firstname":"Ada","lastname":"Lovelace","email":"ada@example.org"}],"warnings":[]}"#;
        let response = MoodleResponse::new(raw.to_string(), serde_json::from_str(raw).unwrap());
        let search: UserSearch = response.decode().unwrap();
        assert_eq!(search.users.len(), 1);
        assert_eq!(search.users[0].id, 5);
        assert_eq!(search.users[0].email, "ada@example.org");
    }

    #[test]
    fn decode_created_users() {
        let raw = r#"[{"id":12,"username":"grace"}]"#;
        let response = MoodleResponse::new(raw.to_string(), serde_json::from_str(raw).unwrap());
        let created: Vec<CreatedUser> = response.decode().unwrap();
        assert_eq!(created[0].id, 12);
    }

    #[test]
    fn into_json_yields_decoded_payload() {
        let raw = r#"[{"id":1,"shortname":"site","fullname":"Mock Moodle"}]"#;
        let response = MoodleResponse::new(raw.to_string(), serde_json::from_str(raw).unwrap());
        let json = response.into_json();
        assert_eq!(json[0]["shortname"], "site");
        assert_eq!(json.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn decode_shape_mismatch_keeps_raw_body() {
        let raw = r#"{"id":5}"#;
        let response = MoodleResponse::new(raw.to_string(), serde_json::from_str(raw).unwrap());
        let err = response.decode::<Vec<Course>>().unwrap_err();
        assert!(matches!(err, MoodleError::Decode { .. }));
        assert_eq!(err.raw_body(), Some(raw));
    }
}
