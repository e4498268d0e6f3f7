//! The mailbox operations the client needs from MailHog.
//!
//! [`HttpGateway`](crate::HttpGateway) implements [`Gateway`] over MailHog's HTTP API.
//! Implement it yourself to put the client in front of something else, for example
//! an in-memory mailbox in unit tests.

use crate::error::{Error, Result};
use crate::model::MessagesPage;
use email_address::EmailAddress;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::future::Future;

/// Which part of a message a search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    /// The sender.
    From,
    /// The recipients.
    To,
    /// Anywhere in the message.
    Containing,
}

impl SearchKind {
    /// Returns the value MailHog expects for the `kind` query parameter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SearchKind::From => "from",
            SearchKind::To => "to",
            SearchKind::Containing => "containing",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote mailbox holding captured emails.
///
/// Listing operations return messages sorted from latest to earliest. Every method
/// reports an unreachable store or a non-success status as an error; callers never
/// see a failed request as an empty page.
pub trait Gateway: Send + Sync {
    /// Lists up to `limit` messages starting at `start`.
    fn list_messages(
        &self,
        start: usize,
        limit: usize,
    ) -> impl Future<Output = Result<MessagesPage>> + Send;

    /// Lists up to `limit` messages matching `query`, starting at `start`.
    fn search_messages(
        &self,
        query: &str,
        kind: SearchKind,
        start: usize,
        limit: usize,
    ) -> impl Future<Output = Result<MessagesPage>> + Send;

    /// Deletes one message.
    fn delete_message(&self, id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Deletes every message.
    fn delete_all(&self) -> impl Future<Output = Result<()>> + Send;

    /// Delivers a captured message to a real SMTP server.
    fn release_message(
        &self,
        id: &str,
        config: &ReleaseConfig,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// SMTP authentication mechanism used when releasing a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMechanism {
    /// `PLAIN`
    Plain,
    /// `CRAM-MD5`
    CramMd5,
}

impl AuthMechanism {
    /// Returns the SASL name of the mechanism.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMechanism::Plain => "PLAIN",
            AuthMechanism::CramMd5 => "CRAM-MD5",
        }
    }
}

/// SMTP server a captured message is released to.
///
/// The password is stored as a [`SecretString`] and never shown in `Debug` output.
///
/// ```
/// use mailhog_sync::{AuthMechanism, ReleaseConfig};
///
/// let release = ReleaseConfig::new("smtp.example.com", 587, "inbox@example.com")
///     .unwrap()
///     .credentials("relay", "secret")
///     .mechanism(AuthMechanism::CramMd5);
/// assert_eq!(release.email(), "inbox@example.com");
/// ```
#[derive(Clone)]
pub struct ReleaseConfig {
    /// SMTP host.
    pub host: String,
    /// SMTP port.
    pub port: u16,
    email: EmailAddress,
    username: Option<String>,
    password: Option<SecretString>,
    /// Authentication mechanism, if the server requires one.
    pub mechanism: Option<AuthMechanism>,
}

impl ReleaseConfig {
    /// Creates a release target delivering to `email` through `host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEmailFormat`] if `email` is not a valid address, or
    /// [`Error::InvalidConfig`] if `host` is empty.
    pub fn new(host: impl Into<String>, port: u16, email: &str) -> Result<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "release host is required".into(),
            });
        }

        let email = email.parse::<EmailAddress>().map_err(|_| Error::InvalidEmailFormat {
            email: email.to_string(),
        })?;

        Ok(Self {
            host,
            port,
            email,
            username: None,
            password: None,
            mechanism: None,
        })
    }

    /// Sets SMTP credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Sets the SMTP authentication mechanism.
    #[must_use]
    pub fn mechanism(mut self, mechanism: AuthMechanism) -> Self {
        self.mechanism = Some(mechanism);
        self
    }

    /// Returns the recipient address.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the SMTP username.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the SMTP password.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|password| password.expose_secret())
    }
}

impl fmt::Debug for ReleaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("email", &self.email.as_str())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("mechanism", &self.mechanism)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_kind_values() {
        assert_eq!(SearchKind::From.as_str(), "from");
        assert_eq!(SearchKind::To.as_str(), "to");
        assert_eq!(SearchKind::Containing.to_string(), "containing");
    }

    #[test]
    fn test_release_config_validation() {
        assert!(matches!(
            ReleaseConfig::new("smtp.local", 25, "not-an-email"),
            Err(Error::InvalidEmailFormat { .. })
        ));
        assert!(matches!(
            ReleaseConfig::new("  ", 25, "user@example.com"),
            Err(Error::InvalidConfig { .. })
        ));

        let release = ReleaseConfig::new("smtp.local", 1025, "user@example.com").unwrap();
        assert_eq!(release.port, 1025);
        assert!(release.username().is_none());
        assert!(release.password().is_none());
    }

    #[test]
    fn test_release_password_not_in_debug() {
        let release = ReleaseConfig::new("smtp.local", 25, "user@example.com")
            .unwrap()
            .credentials("relay", "super-secret-password")
            .mechanism(AuthMechanism::Plain);

        assert_eq!(release.password(), Some("super-secret-password"));
        let debug_str = format!("{release:?}");
        assert!(!debug_str.contains("super-secret-password"));
        assert!(debug_str.contains("[REDACTED]"));
        assert_eq!(AuthMechanism::CramMd5.as_str(), "CRAM-MD5");
    }
}
