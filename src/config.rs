//! Client configuration.
//!
//! Holds the credential pair, the base endpoint, and the rate limiter
//! tuning. Everything is validated once when the client is built.

use crate::error::{Error, Result};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default public API endpoint.
pub const DEFAULT_BASE_ENDPOINT: &str = "https://api.nimbus.example/api";

/// Default admission budget: 800 requests per rolling minute.
pub const DEFAULT_MAX_REQUESTS: usize = 800;

/// Default rate limiter window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Immutable basic-auth credential pair.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The secret must never end up in logs.
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[redacted]")
            .finish()
    }
}

/// Configuration consumed by [`crate::NimbusClient::new`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    /// Base endpoint; trailing slashes are trimmed once at client build.
    pub base_endpoint: String,
    /// Requests admitted per rolling `window`.
    pub max_requests: usize,
    pub window: Duration,
    /// Upper bound on how long one call may block in the limiter.
    /// `None` means wait as long as it takes.
    pub wait_timeout: Option<Duration>,
    /// Page size used by `list_all`.
    pub page_size: usize,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(api_key, api_secret),
            base_endpoint: DEFAULT_BASE_ENDPOINT.to_string(),
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
            wait_timeout: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Build a configuration from the environment.
    ///
    /// Reads `NIMBUS_API_KEY` and `NIMBUS_API_SECRET` (required), plus
    /// `NIMBUS_BASE_ENDPOINT`, `NIMBUS_MAX_REQUESTS` and
    /// `NIMBUS_WINDOW_SECS` (optional overrides).
    pub fn from_env() -> Result<Self> {
        let api_key = required_env("NIMBUS_API_KEY")?;
        let api_secret = required_env("NIMBUS_API_SECRET")?;
        let mut config = Self::new(api_key, api_secret);

        if let Ok(endpoint) = std::env::var("NIMBUS_BASE_ENDPOINT") {
            config.base_endpoint = endpoint;
        }
        if let Ok(raw) = std::env::var("NIMBUS_MAX_REQUESTS") {
            config.max_requests = parse_env("NIMBUS_MAX_REQUESTS", &raw)?;
        }
        if let Ok(raw) = std::env::var("NIMBUS_WINDOW_SECS") {
            config.window = Duration::from_secs(parse_env("NIMBUS_WINDOW_SECS", &raw)?);
        }
        Ok(config)
    }

    pub fn with_base_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.base_endpoint = endpoint.into();
        self
    }

    pub fn with_rate_limit(mut self, max_requests: usize, window: Duration) -> Self {
        self.max_requests = max_requests;
        self.window = window;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Reject unusable configurations before any request is issued.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.credentials.api_key.is_empty() {
            return Err(Error::Config("api_key must not be empty".into()));
        }
        if self.credentials.api_secret.is_empty() {
            return Err(Error::Config("api_secret must not be empty".into()));
        }
        if self.max_requests == 0 {
            return Err(Error::Config("max_requests must be at least 1".into()));
        }
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be at least 1".into()));
        }
        Url::parse(&self.base_endpoint)
            .map_err(|err| Error::Config(format!("invalid base endpoint: {err}")))?;
        Ok(())
    }
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::Config(format!("{name} is not set"))),
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::Config(format!("{name} has an invalid value: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let config = ClientConfig::new("key", "secret");
        assert_eq!(config.base_endpoint, DEFAULT_BASE_ENDPOINT);
        assert_eq!(config.max_requests, 800);
        assert_eq!(config.window, Duration::from_secs(60));
        assert_eq!(config.page_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_max_requests_is_rejected() {
        let config = ClientConfig::new("key", "secret").with_rate_limit(0, DEFAULT_WINDOW);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn empty_credentials_are_rejected() {
        assert!(ClientConfig::new("", "secret").validate().is_err());
        assert!(ClientConfig::new("key", "").validate().is_err());
    }

    #[test]
    fn garbage_endpoint_is_rejected() {
        let config = ClientConfig::new("key", "secret").with_base_endpoint("not a url");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn debug_redacts_the_secret() {
        let rendered = format!("{:?}", Credentials::new("key-1", "very-secret"));
        assert!(rendered.contains("key-1"));
        assert!(!rendered.contains("very-secret"));
    }
}
