//! # mailhog-sync
//!
//! Async MailHog client for test suites that assert an email was eventually sent.
//!
//! This crate provides a high-level, async API for:
//! - Retrieving captured emails by sender, recipient, subject, body and date, retrying
//!   while SMTP delivery catches up
//! - Deleting or releasing single emails and whole matching batches
//! - Decoding base64 and quoted-printable content in any charset
//!
//! ## Features
//!
//! - **`observability`**: Enables OpenTelemetry integration for distributed tracing.
//!   Without this feature, tracing spans are still emitted but require no OTEL dependencies.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailhog_sync::{FindCriteria, MailhogClient, MailhogConfig};
//!
//! # async fn example() -> mailhog_sync::Result<()> {
//! // Configure the client
//! let config = MailhogConfig::builder()
//!     .host("localhost")
//!     .port(8025)
//!     .num_retries(10)       // Poll up to 11 times...
//!     .retry_delay_ms(200)   // ...200ms apart
//!     .build()?;
//!
//! let client = MailhogClient::new(config)?;
//!
//! // Wait for the welcome email
//! let email = client
//!     .get_last_email(&FindCriteria::new().to("user@example.com").subject("Welcome"))
//!     .await?
//!     .expect("welcome email was sent");
//! println!("Got: {}", email.subject);
//!
//! // Clean up
//! client.clear_all_emails().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Searching the Body
//!
//! A `body` constraint is resolved by MailHog's own search, so only messages
//! containing the text are transferred:
//!
//! ```no_run
//! use mailhog_sync::{FindCriteria, MailhogClient, MailhogConfig};
//!
//! # async fn example() -> mailhog_sync::Result<()> {
//! # let client = MailhogClient::new(MailhogConfig::builder().build()?)?;
//! let emails = client
//!     .get_all_emails(&FindCriteria::new().body("https://app.example.com/activate/"))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Decoding Content
//!
//! ```
//! use mailhog_sync::codec::{decode, encode};
//! use mailhog_sync::Encoding;
//!
//! # fn example() -> mailhog_sync::Result<()> {
//! let encoded = encode("Grüße", Encoding::QuotedPrintable, None, None)?;
//! assert_eq!(encoded, "Gr=C3=BC=C3=9Fe");
//! assert_eq!(decode(&encoded, Encoding::QuotedPrintable, None)?, "Grüße");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All errors implement `std::error::Error` and provide context. A retrieval that finds
//! nothing is not an error: it returns an empty vector. Use [`Error::is_retryable`]
//! to determine if a failed request can be retried:
//!
//! ```
//! use mailhog_sync::Error;
//!
//! fn handle_error(error: &Error) {
//!     if error.is_retryable() {
//!         println!("Transient error, can retry: {}", error);
//!     } else {
//!         println!("Permanent error: {}", error);
//!     }
//! }
//! ```
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation. All major operations emit spans with
//! structured fields suitable for distributed tracing.
//!
//! ### Span Naming Convention
//!
//! - `MailhogClient::get_all_emails` - Retrieval with criteria
//! - `MailhogClient::delete_emails` - Batch delete
//! - `MailhogClient::release_emails` - Batch release
//! - `retrieval::retrieve` - Retry loop
//! - `session::list_messages` - `GET /api/v2/messages`
//! - `session::search_messages` - `GET /api/v2/search`
//!
//! ### Standard Fields
//!
//! - `base_url` - MailHog base URL
//! - `proxy_enabled` - Whether proxy is used
//! - `attempt` - Attempt number within a retrieval
//! - `id` - MailHog message id
//!
//! Enable the `observability` feature for OpenTelemetry integration: failed MailHog
//! requests then also tag their span with `mailhog.error.category` and
//! `mailhog.error.retryable` attributes for an OpenTelemetry layer to export.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod codec;
pub mod config;
pub mod criteria;
pub mod error;
pub mod gateway;
pub mod matcher;
pub mod model;
pub mod proxy;

// Internal modules
mod client;
mod parser;
mod retrieval;
mod session;
mod telemetry;

// Re-exports for ergonomic API
pub use client::{BatchFailure, BatchOperation, BatchReport, MailhogClient};
pub use codec::{Decoding, Encoding};
pub use config::{MailhogConfig, MailhogConfigBuilder, TimeoutConfig, DEFAULT_FETCH_LIMIT};
pub use criteria::{FindCriteria, RetryPolicy};
pub use error::{Error, ErrorCategory, Result};
pub use gateway::{AuthMechanism, Gateway, ReleaseConfig, SearchKind};
pub use model::{Attachment, Email, MessagesPage};
pub use proxy::{Proxy, ProxyAuth, ProxyScheme};
pub use session::HttpGateway;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // Ensure all public types are accessible
        let _ = MailhogConfig::builder();
        let _ = Proxy::socks5("localhost", 1080);
        let _ = FindCriteria::new().decode(Decoding::new(Encoding::Base64));
        let _ = RetryPolicy::BASELINE;
    }

    #[test]
    fn test_client_from_default_config() {
        let config = MailhogConfig::builder().build().unwrap();
        let client = MailhogClient::new(config).unwrap();
        assert_eq!(
            client.gateway().base_url().as_str(),
            "http://localhost:8025/"
        );
    }
}
