//! Proxy configuration for MailHog API requests.
//!
//! Test environments often reach MailHog through a jump host or a container network
//! gateway. A [`Proxy`] routes every gateway request through an HTTP or SOCKS5 proxy.
//!
//! # Example
//!
//! ```
//! use mailhog_sync::Proxy;
//!
//! // HTTP proxy without authentication
//! let proxy = Proxy::http("proxy.example.com", 3128);
//!
//! // SOCKS5 proxy with authentication
//! let proxy = Proxy::socks5("proxy.example.com", 1080).with_auth("username", "password");
//! ```

use crate::error::{Error, Result};

/// Proxy protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyScheme {
    /// Plain HTTP proxy (`CONNECT` for TLS targets).
    Http,
    /// SOCKS5 proxy with remote DNS resolution.
    Socks5,
}

impl ProxyScheme {
    fn as_str(self) -> &'static str {
        match self {
            ProxyScheme::Http => "http",
            ProxyScheme::Socks5 => "socks5h",
        }
    }
}

/// Proxy configuration.
#[derive(Debug, Clone)]
pub struct Proxy {
    /// Proxy protocol.
    pub scheme: ProxyScheme,
    /// Proxy server hostname or IP address.
    pub host: String,
    /// Proxy server port.
    pub port: u16,
    /// Optional authentication credentials.
    pub auth: Option<ProxyAuth>,
}

/// Authentication credentials for a proxy.
#[derive(Clone)]
pub struct ProxyAuth {
    /// Username for proxy authentication.
    pub username: String,
    /// Password for proxy authentication.
    pub password: String,
}

impl std::fmt::Debug for ProxyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyAuth")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Proxy {
    /// Creates an HTTP proxy configuration without authentication.
    ///
    /// # Example
    ///
    /// ```
    /// use mailhog_sync::Proxy;
    ///
    /// let proxy = Proxy::http("192.168.1.1", 3128);
    /// ```
    #[must_use]
    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: ProxyScheme::Http,
            host: host.into(),
            port,
            auth: None,
        }
    }

    /// Creates a SOCKS5 proxy configuration without authentication.
    #[must_use]
    pub fn socks5(host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: ProxyScheme::Socks5,
            host: host.into(),
            port,
            auth: None,
        }
    }

    /// Adds authentication credentials.
    #[must_use]
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(ProxyAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Returns the proxy address as "host:port".
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns `true` if this proxy requires authentication.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.auth.is_some()
    }

    /// Returns the proxy URL without credentials, e.g. `socks5h://host:1080`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{}", self.scheme.as_str(), self.address())
    }

    /// Converts this configuration into a proxy applied to all requests.
    pub(crate) fn to_reqwest(&self) -> Result<reqwest::Proxy> {
        let proxy = reqwest::Proxy::all(self.url()).map_err(|source| Error::InvalidUrl {
            url: self.url(),
            message: source.to_string(),
        })?;

        Ok(match &self.auth {
            Some(auth) => proxy.basic_auth(&auth.username, &auth.password),
            None => proxy,
        })
    }
}

impl std::fmt::Display for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.auth {
            Some(auth) => write!(
                f,
                "{}://{}:***@{}:{}",
                self.scheme.as_str(),
                auth.username,
                self.host,
                self.port
            ),
            None => f.write_str(&self.url()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_without_auth() {
        let proxy = Proxy::http("192.168.1.1", 3128);
        assert_eq!(proxy.host, "192.168.1.1");
        assert_eq!(proxy.port, 3128);
        assert!(proxy.auth.is_none());
        assert!(!proxy.requires_auth());
        assert_eq!(proxy.address(), "192.168.1.1:3128");
        assert_eq!(proxy.url(), "http://192.168.1.1:3128");
    }

    #[test]
    fn test_proxy_with_auth() {
        let proxy = Proxy::socks5("proxy.example.com", 1080).with_auth("user", "pass");
        assert_eq!(proxy.scheme, ProxyScheme::Socks5);
        assert!(proxy.requires_auth());
        assert_eq!(proxy.url(), "socks5h://proxy.example.com:1080");

        let auth = proxy.auth.as_ref().unwrap();
        assert_eq!(auth.username, "user");
        assert_eq!(auth.password, "pass");
    }

    #[test]
    fn test_display_masks_password() {
        let proxy = Proxy::socks5("proxy.example.com", 1080).with_auth("user", "secret");
        let display = proxy.to_string();
        assert!(display.contains("***"));
        assert!(!display.contains("secret"));
        assert!(!format!("{proxy:?}").contains("secret"));
    }

    #[test]
    fn test_to_reqwest_accepts_both_schemes() {
        assert!(Proxy::http("localhost", 3128).to_reqwest().is_ok());
        assert!(Proxy::socks5("localhost", 1080)
            .with_auth("user", "pass")
            .to_reqwest()
            .is_ok());
    }
}
