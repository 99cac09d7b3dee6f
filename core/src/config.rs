//! Credentials and host settings lookup.
//!
//! The CRM keeps the webservice token and the Moodle base domain in its
//! settings store under `moodle_access_token` and `moodle_domain`. They are
//! read once into a `MoodleConfig`, which the client owns for its lifetime.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ConfigError;

/// Settings key for the webservice token.
pub const ACCESS_TOKEN_KEY: &str = "moodle_access_token";
/// Settings key for the Moodle base URL.
pub const DOMAIN_KEY: &str = "moodle_domain";

/// Fixed path of Moodle's REST entry point, relative to the domain.
pub const WEBSERVICE_PATH: &str = "webservice/rest/server.php";

/// Read access to the host's settings store.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
}

/// Settings read from process environment variables.
///
/// `moodle_access_token` is looked up as `MOODLE_ACCESS_TOKEN`, and so on.
#[derive(Debug, Clone, Default)]
pub struct EnvSettings;

impl EnvSettings {
    /// Load a `.env` file from the working directory or its parents (if any)
    /// before reading.
    pub fn load() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
        }
        Self
    }

    /// Load the given env file. Variables already set in the process win.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile(e.to_string()))?;
        tracing::debug!(path = %path.display(), "loaded env file");
        Ok(Self)
    }
}

impl SettingsStore for EnvSettings {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key.to_ascii_uppercase()).ok()
    }
}

/// In-memory settings, for embedding hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MapSettings(HashMap<String, String>);

impl MapSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl SettingsStore for MapSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// Webservice credentials. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct MoodleConfig {
    token: String,
    domain: String,
}

impl MoodleConfig {
    /// `domain` is normalized to end with exactly one `/`.
    pub fn new(token: impl Into<String>, domain: &str) -> Self {
        Self {
            token: token.into(),
            domain: format!("{}/", domain.trim_end_matches('/')),
        }
    }

    pub fn from_settings(settings: &dyn SettingsStore) -> Result<Self, ConfigError> {
        let token = required(settings, ACCESS_TOKEN_KEY)?;
        let domain = required(settings, DOMAIN_KEY)?;
        Ok(Self::new(token, &domain))
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Base domain, always ending in a single `/`.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.domain, WEBSERVICE_PATH)
    }
}

// The token is a shared secret; keep it out of debug output.
impl std::fmt::Debug for MoodleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoodleConfig")
            .field("token", &"<redacted>")
            .field("domain", &self.domain)
            .finish()
    }
}

fn required(settings: &dyn SettingsStore, key: &'static str) -> Result<String, ConfigError> {
    match settings.get(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingSetting(key)),
    }
}
