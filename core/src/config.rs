//! Client configuration.
//!
//! Everything the transport needs besides its collaborators lives in
//! `ClientConfig`. The struct deserializes with defaults so it can be
//! embedded in a larger settings file, and `from_env` covers the
//! twelve-factor case.

use std::env;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SLOW_RESPONSE_THRESHOLD: Duration = Duration::from_millis(3_000);
const DEFAULT_USER_AGENT: &str = concat!("library-sync/", env!("CARGO_PKG_VERSION"));

pub const ENV_BASE_URL: &str = "LIBRARY_SYNC_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "LIBRARY_SYNC_TIMEOUT_SECS";
pub const ENV_SLOW_MS: &str = "LIBRARY_SYNC_SLOW_MS";

/// Static settings for an `ApiClient`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every request path is joined onto, without a trailing slash.
    #[serde(deserialize_with = "trimmed_base_url")]
    pub base_url: String,
    /// Per-request timeout. Expiry cancels that request only.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Successful requests slower than this also emit a slow-response event.
    #[serde(with = "duration_millis")]
    pub slow_response_threshold: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout: DEFAULT_TIMEOUT,
            slow_response_threshold: DEFAULT_SLOW_RESPONSE_THRESHOLD,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_slow_response_threshold(mut self, threshold: Duration) -> Self {
        self.slow_response_threshold = threshold;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Read overrides from `LIBRARY_SYNC_*` variables on top of the defaults.
    ///
    /// Unparsable numeric values are ignored with a warning rather than
    /// failing startup.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = normalize_base_url(&base_url);
        }
        if let Some(secs) = parse_number(&lookup, ENV_TIMEOUT_SECS) {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(millis) = parse_number(&lookup, ENV_SLOW_MS) {
            config.slow_response_threshold = Duration::from_millis(millis);
        }
        config
    }

    /// Join a request path onto the base URL.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

fn parse_number(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(key, value = %raw, %error, "ignoring invalid config value");
            None
        }
    }
}

fn trimmed_base_url<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|base_url| normalize_base_url(&base_url))
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::new("http://localhost:3000/api/");
        assert_eq!(config.base_url, "http://localhost:3000/api");
        assert_eq!(config.url_for("/v1/locations"), "http://localhost:3000/api/v1/locations");
        assert_eq!(config.url_for("v1/locations"), "http://localhost:3000/api/v1/locations");
    }

    #[test]
    fn default_timeouts() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.slow_response_threshold, Duration::from_secs(3));
    }

    #[test]
    fn deserializes_partial_settings() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"https://api.example.test","timeout":5}"#).unwrap();
        assert_eq!(config.base_url, "https://api.example.test");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.slow_response_threshold, Duration::from_secs(3));

        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"https://api.example.test/"}"#).unwrap();
        assert_eq!(config.base_url, "https://api.example.test");
        assert_eq!(config.url_for("/v1/library/bff"), "https://api.example.test/v1/library/bff");
    }

    #[test]
    fn env_lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_BASE_URL, "https://library.example.test/"),
            (ENV_TIMEOUT_SECS, "12"),
            (ENV_SLOW_MS, "not-a-number"),
        ]);
        let config = ClientConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.base_url, "https://library.example.test");
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.slow_response_threshold, DEFAULT_SLOW_RESPONSE_THRESHOLD);
    }
}
