//! Configuration for the MailHog client.
//!
//! Use [`MailhogConfigBuilder`] to create a configuration with sensible defaults:
//!
//! ```
//! use mailhog_sync::MailhogConfig;
//!
//! let config = MailhogConfig::builder()
//!     .host("mailhog")
//!     .port(8025)
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.base_url().as_str(), "http://mailhog:8025/");
//! ```

use crate::criteria::FindCriteria;
use crate::error::{Error, Result};
use crate::proxy::Proxy;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Default number of messages fetched per attempt.
///
/// MailHog in a test environment is small and ephemeral, so one request of this
/// size covers everything it holds.
pub const DEFAULT_FETCH_LIMIT: usize = 5000;

/// Configuration for connecting to a MailHog instance.
///
/// Create using [`MailhogConfig::builder()`].
///
/// Note: The basic auth password is stored as a [`SecretString`] to prevent
/// accidental logging of credentials.
#[derive(Clone)]
pub struct MailhogConfig {
    base_url: Url,
    username: Option<String>,
    password: Option<SecretString>,
    /// Optional proxy for API requests.
    pub proxy: Option<Proxy>,
    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
    /// Messages fetched per retrieval attempt.
    pub fetch_limit: usize,
    /// Client-level find criteria, applied under every call's criteria.
    pub defaults: FindCriteria,
}

impl std::fmt::Debug for MailhogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailhogConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("proxy", &self.proxy)
            .field("timeouts", &self.timeouts)
            .field("fetch_limit", &self.fetch_limit)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl MailhogConfig {
    /// Creates a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use mailhog_sync::MailhogConfig;
    ///
    /// let config = MailhogConfig::builder()
    ///     .base_url("https://mail.test.internal/mailhog")
    ///     .basic_auth("admin", "secret")
    ///     .build()
    ///     .expect("valid config");
    /// ```
    #[must_use]
    pub fn builder() -> MailhogConfigBuilder {
        MailhogConfigBuilder::default()
    }

    /// Returns the MailHog base URL; API paths are resolved relative to it.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the basic auth username, if configured.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the basic auth password, if configured.
    ///
    /// The password is intentionally not directly accessible to prevent accidental logging.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|password| password.expose_secret())
    }
}

/// Timeout configuration for API requests.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for establishing the TCP/TLS connection.
    pub connect: Duration,
    /// Timeout for a whole request, including reading the response.
    pub request: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(30),
        }
    }
}

/// Builder for [`MailhogConfig`].
#[derive(Debug, Default)]
pub struct MailhogConfigBuilder {
    base_url: Option<String>,
    protocol: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    base_path: Option<String>,
    username: Option<String>,
    password: Option<String>,
    proxy: Option<Proxy>,
    timeouts: Option<TimeoutConfig>,
    fetch_limit: Option<usize>,
    defaults: Option<FindCriteria>,
}

impl MailhogConfigBuilder {
    /// Sets the full base URL, e.g. `http://mailhog:8025`.
    ///
    /// Overrides [`protocol`](Self::protocol), [`host`](Self::host),
    /// [`port`](Self::port) and [`base_path`](Self::base_path).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the protocol (default: `http`).
    #[must_use]
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Sets the host (default: `localhost`).
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the API port (default: 8025).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets a path prefix MailHog is served under, e.g. `/mailhog`.
    #[must_use]
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Sets HTTP basic auth credentials for the MailHog UI/API.
    #[must_use]
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets a proxy for API requests.
    #[must_use]
    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Sets timeout configuration.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .connect = timeout;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .request = timeout;
        self
    }

    /// Sets how many messages each retrieval attempt fetches (default: 5000).
    #[must_use]
    pub fn fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = Some(limit);
        self
    }

    /// Sets client-level find criteria, applied under every call's criteria.
    #[must_use]
    pub fn defaults(mut self, defaults: FindCriteria) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Sets the client-level number of retries.
    #[must_use]
    pub fn num_retries(mut self, num_retries: u32) -> Self {
        self.defaults = Some(self.defaults.unwrap_or_default().num_retries(num_retries));
        self
    }

    /// Sets the client-level delay between retrieval attempts.
    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.defaults = Some(self.defaults.unwrap_or_default().retry_delay(delay));
        self
    }

    /// Sets the client-level delay between retrieval attempts in milliseconds.
    #[must_use]
    pub fn retry_delay_ms(self, millis: u64) -> Self {
        self.retry_delay(Duration::from_millis(millis))
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL parts do not form a valid URL or a limit is zero.
    pub fn build(self) -> Result<MailhogConfig> {
        let raw_url = match self.base_url {
            Some(url) => url,
            None => format!(
                "{}://{}:{}{}",
                self.protocol.as_deref().unwrap_or("http"),
                self.host.as_deref().unwrap_or("localhost"),
                self.port.unwrap_or(8025),
                normalize_base_path(self.base_path.as_deref().unwrap_or_default()),
            ),
        };
        let base_url = parse_base_url(&raw_url)?;

        let fetch_limit = validate_fetch_limit(self.fetch_limit.unwrap_or(DEFAULT_FETCH_LIMIT))?;

        if self.password.is_some() && self.username.as_deref().is_some_and(str::is_empty) {
            return Err(Error::InvalidConfig {
                message: "basic auth username must not be empty".into(),
            });
        }

        Ok(MailhogConfig {
            base_url,
            username: self.username,
            password: self.password.map(SecretString::from),
            proxy: self.proxy,
            timeouts: self.timeouts.unwrap_or_default(),
            fetch_limit,
            defaults: self.defaults.unwrap_or_default(),
        })
    }
}

/// Rejects a zero fetch limit, which could never return a message.
pub(crate) fn validate_fetch_limit(fetch_limit: usize) -> Result<usize> {
    if fetch_limit == 0 {
        return Err(Error::InvalidConfig {
            message: "fetch limit must be greater than zero".into(),
        });
    }
    Ok(fetch_limit)
}

fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Parses and validates the base URL, ensuring a trailing slash so relative API
/// paths keep any base path prefix.
fn parse_base_url(raw: &str) -> Result<Url> {
    let invalid = |message: String| Error::InvalidUrl {
        url: raw.to_string(),
        message,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".into()));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
