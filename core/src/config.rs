//! Client configuration: credentials, endpoint, and transport defaults.

use std::fmt;
use std::time::Duration;

use crate::error::JoboError;

pub const DEFAULT_BASE_URL: &str = "https://jobs-api.jobo.world";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = concat!("jobo-rust/", env!("CARGO_PKG_VERSION"));
pub const API_KEY_HEADER: &str = "X-Api-Key";

pub const ENV_API_KEY: &str = "JOBO_API_KEY";
pub const ENV_BASE_URL: &str = "JOBO_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "JOBO_TIMEOUT_SECS";

/// Settings shared by every request a client issues.
///
/// `timeout` is applied by the default transports only; a caller-supplied
/// transport keeps whatever timeout it was configured with.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Load from `JOBO_API_KEY`, `JOBO_BASE_URL`, and `JOBO_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, JoboError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, JoboError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .ok_or_else(|| JoboError::Config(format!("{ENV_API_KEY} is not set")))?;
        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(base_url);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                JoboError::Config(format!("{ENV_TIMEOUT_SECS} must be whole seconds, got {raw:?}"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::new("key");
        assert_eq!(config.api_key(), "key");
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.user_agent().starts_with("jobo-rust/"));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::new("key").with_base_url("http://localhost:3000//");
        assert_eq!(config.base_url(), "http://localhost:3000");
    }

    #[test]
    fn debug_redacts_api_key() {
        let rendered = format!("{:?}", ClientConfig::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn env_requires_api_key() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, JoboError::Config(_)));
    }

    #[test]
    fn env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "abc"),
            (ENV_BASE_URL, "http://127.0.0.1:9000/"),
            (ENV_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_key(), "abc");
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn env_rejects_bad_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_API_KEY, "abc"), (ENV_TIMEOUT_SECS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, JoboError::Config(_)));
    }
}
