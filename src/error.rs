//! Error types for the mailhog-sync crate.
//!
//! All errors implement [`std::error::Error`] and provide context about what went wrong.
//! Errors are categorized by their retryability - see [`Error::is_retryable`].
//!
//! "No matching email" is deliberately absent from this enum: retrieval reports it
//! as an empty result, never as an error.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during mailbox operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / validation errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid email address format.
    #[error("invalid email format: {email}")]
    InvalidEmailFormat {
        /// The invalid email address.
        email: String,
    },

    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// The MailHog API base URL could not be parsed.
    #[error("invalid MailHog URL '{url}': {message}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why the URL was rejected.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    HttpClient {
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Gateway errors (mixed retryability)
    // ─────────────────────────────────────────────────────────────────────────
    /// The request never produced a response (connect failure, timeout, reset).
    #[error("MailHog request '{operation}' failed for {target}")]
    Request {
        /// The gateway operation, e.g. `list_messages`.
        operation: &'static str,
        /// The endpoint or message id the request targeted.
        target: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// MailHog answered with a non-success status.
    #[error("MailHog request '{operation}' for {target} returned {status}")]
    UnexpectedStatus {
        /// The gateway operation, e.g. `delete_message`.
        operation: &'static str,
        /// The endpoint or message id the request targeted.
        target: String,
        /// The HTTP status returned.
        status: StatusCode,
    },

    /// A MailHog response body was not the expected JSON.
    #[error("failed to parse MailHog response for '{operation}'")]
    ResponseParse {
        /// The gateway operation whose response failed to parse.
        operation: &'static str,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Decoding errors (NOT retryable - the content won't change)
    // ─────────────────────────────────────────────────────────────────────────
    /// The charset label is not known.
    #[error("unknown charset '{charset}'")]
    UnknownCharset {
        /// The rejected charset label.
        charset: String,
    },

    /// The transfer encoding name is not known.
    #[error("unknown transfer encoding '{encoding}'")]
    UnknownEncoding {
        /// The rejected encoding name.
        encoding: String,
    },

    /// Input was not valid base64.
    #[error("invalid base64 input")]
    Base64 {
        /// The underlying base64 error.
        #[source]
        source: base64::DecodeError,
    },

    /// Input was not valid quoted-printable.
    #[error("invalid quoted-printable input")]
    QuotedPrintable {
        /// The underlying quoted-printable error.
        #[source]
        source: quoted_printable::QuotedPrintableError,
    },

    /// Decoded bytes are not valid in the requested charset.
    #[error("decoded bytes are not valid {charset}")]
    MalformedCharset {
        /// The charset label the bytes were interpreted in.
        charset: String,
    },
}

impl Error {
    /// Returns `true` if this error represents a transient failure that might succeed on retry.
    ///
    /// Retrieval never retries these on its own; the retry budget exists for emails
    /// that have not arrived yet, not for an unreachable MailHog. Callers can use this
    /// to decide whether to try the whole operation again:
    ///
    /// ```ignore
    /// if error.is_retryable() {
    ///     // Backoff and retry
    /// } else {
    ///     // Fail permanently
    /// }
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Request { .. } => true,
            Error::UnexpectedStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }

            Error::InvalidEmailFormat { .. }
            | Error::InvalidConfig { .. }
            | Error::InvalidUrl { .. }
            | Error::HttpClient { .. }
            | Error::ResponseParse { .. }
            | Error::UnknownCharset { .. }
            | Error::UnknownEncoding { .. }
            | Error::Base64 { .. }
            | Error::QuotedPrintable { .. }
            | Error::MalformedCharset { .. } => false,
        }
    }

    /// Returns the error category for metrics/logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidEmailFormat { .. }
            | Error::InvalidConfig { .. }
            | Error::InvalidUrl { .. }
            | Error::HttpClient { .. } => ErrorCategory::Configuration,

            Error::Request { .. } => ErrorCategory::Network,

            Error::UnexpectedStatus { .. } => ErrorCategory::Protocol,

            Error::ResponseParse { .. } => ErrorCategory::Parse,

            Error::UnknownCharset { .. }
            | Error::UnknownEncoding { .. }
            | Error::Base64 { .. }
            | Error::QuotedPrintable { .. }
            | Error::MalformedCharset { .. } => ErrorCategory::Decode,
        }
    }

    /// Returns the message id or endpoint this error is about, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Error::Request { target, .. } | Error::UnexpectedStatus { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// Error categories for metrics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration or validation errors.
    Configuration,
    /// MailHog could not be reached.
    Network,
    /// MailHog answered with a non-success status.
    Protocol,
    /// A MailHog response could not be parsed.
    Parse,
    /// Transfer-encoding or charset decoding failed.
    Decode,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::Parse => write!(f, "parse"),
            ErrorCategory::Decode => write!(f, "decode"),
        }
    }
}
