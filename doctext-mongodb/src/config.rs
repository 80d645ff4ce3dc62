//! Connection configuration for the MongoDB backend.

use serde::Deserialize;
use std::{env, time::Duration};

use doctext_core::error::{DocTextError, DocTextResult};

/// Environment variable holding the connection string.
pub const URI_ENV: &str = "DOCTEXT_MONGODB_URI";
/// Environment variable holding the bootstrap timeout in seconds.
pub const CONNECT_TIMEOUT_ENV: &str = "DOCTEXT_CONNECT_TIMEOUT_SECS";
/// Environment variable holding the application name reported to the server.
pub const APP_NAME_ENV: &str = "DOCTEXT_APP_NAME";

pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_APP_NAME: &str = "doctext";

/// Settings used to establish the connection.
///
/// Every field has a default, so a partial configuration file (or none at
/// all) is valid:
///
/// ```ignore
/// let config: MongoDbConfig = serde_json::from_str(r#"{"uri": "mongodb://db:27017"}"#)?;
/// assert_eq!(config.connect_timeout(), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MongoDbConfig {
    /// MongoDB connection string.
    pub uri: String,
    /// Upper bound on connecting plus the initial liveness check, in seconds.
    pub connect_timeout_secs: u64,
    /// Application name reported in server logs.
    pub app_name: Option<String>,
}

impl Default for MongoDbConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            app_name: Some(DEFAULT_APP_NAME.to_string()),
        }
    }
}

impl MongoDbConfig {
    /// Builds a configuration with the given connection string and default settings.
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into(), ..Self::default() }
    }

    /// Reads the configuration from the environment, falling back to defaults
    /// for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`DocTextError::Initialization`] if the timeout variable is set
    /// but is not a whole number of seconds.
    pub fn from_env() -> DocTextResult<Self> {
        let mut config = Self::default();

        if let Ok(uri) = env::var(URI_ENV) {
            config.uri = uri;
        }
        if let Ok(timeout) = env::var(CONNECT_TIMEOUT_ENV) {
            config.connect_timeout_secs = timeout
                .trim()
                .parse()
                .map_err(|_| DocTextError::Initialization(format!(
                    "{CONNECT_TIMEOUT_ENV} must be a whole number of seconds, got {timeout:?}"
                )))?;
        }
        if let Ok(app_name) = env::var(APP_NAME_ENV) {
            config.app_name = Some(app_name);
        }

        Ok(config)
    }

    /// The bootstrap timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_server() {
        let config = MongoDbConfig::default();

        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.app_name.as_deref(), Some("doctext"));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: MongoDbConfig = serde_json::from_str(r#"{"uri": "mongodb://db:27017"}"#).unwrap();

        assert_eq!(config.uri, "mongodb://db:27017");
        assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    }
}
