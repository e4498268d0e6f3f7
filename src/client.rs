//! MailHog client for test suites.
//!
//! The [`MailhogClient`] is the main entry point for this crate. It provides
//! async methods to:
//!
//! - Retrieve captured emails matching [`FindCriteria`], retrying while delivery catches up
//! - Delete or release single emails and whole matching batches
//! - Peek at the latest email from or to an address
//!
//! # Example
//!
//! ```no_run
//! use mailhog_sync::{FindCriteria, MailhogClient, MailhogConfig};
//!
//! # async fn example() -> mailhog_sync::Result<()> {
//! let config = MailhogConfig::builder()
//!     .host("localhost")
//!     .port(8025)
//!     .build()?;
//!
//! let client = MailhogClient::new(config)?;
//!
//! // Wait for the password reset email
//! let inbox = client
//!     .get_inbox("user@example.com", &FindCriteria::new().subject("Reset"))
//!     .await?;
//! assert_eq!(inbox.len(), 1);
//!
//! // Clean up
//! let report = client.clear_inbox("user@example.com").await?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

use crate::config::{validate_fetch_limit, MailhogConfig, DEFAULT_FETCH_LIMIT};
use crate::criteria::FindCriteria;
use crate::error::{Error, Result};
use crate::gateway::{Gateway, ReleaseConfig, SearchKind};
use crate::model::Email;
use crate::retrieval;
use crate::session::HttpGateway;
use futures::future::join_all;
use std::fmt;
use tracing::{debug, instrument};

/// Async MailHog client for retrieving, deleting and releasing captured emails.
///
/// Create using [`MailhogClient::new`] for a real MailHog, or
/// [`MailhogClient::with_gateway`] for any other [`Gateway`].
///
/// Criteria passed to a call are merged over the client-level defaults, which are
/// in turn merged over [`RetryPolicy::BASELINE`](crate::RetryPolicy::BASELINE).
pub struct MailhogClient<G = HttpGateway> {
    gateway: G,
    defaults: FindCriteria,
    fetch_limit: usize,
}

impl MailhogClient<HttpGateway> {
    /// Creates a client talking to MailHog over HTTP.
    ///
    /// No request is made until the first operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built from `config`, for example
    /// because of an invalid proxy.
    ///
    /// # Example
    ///
    /// ```
    /// use mailhog_sync::{MailhogClient, MailhogConfig};
    ///
    /// # fn example() -> mailhog_sync::Result<()> {
    /// let config = MailhogConfig::builder()
    ///     .base_url("http://mailhog:8025")
    ///     .num_retries(10)
    ///     .build()?;
    ///
    /// let client = MailhogClient::new(config)?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(
        name = "MailhogClient::new",
        skip_all,
        fields(
            base_url = %config.base_url(),
            proxy_enabled = config.proxy.is_some()
        )
    )]
    pub fn new(config: MailhogConfig) -> Result<Self> {
        let gateway = HttpGateway::new(&config)?;

        debug!(fetch_limit = config.fetch_limit, "Client ready");

        Ok(Self {
            gateway,
            defaults: config.defaults,
            fetch_limit: config.fetch_limit,
        })
    }
}

impl<G: Gateway> MailhogClient<G> {
    /// Creates a client on top of an existing gateway, with no client-level
    /// defaults and [`DEFAULT_FETCH_LIMIT`].
    #[must_use]
    pub fn with_gateway(gateway: G) -> Self {
        Self {
            gateway,
            defaults: FindCriteria::default(),
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }

    /// Replaces the client-level default criteria.
    #[must_use]
    pub fn with_defaults(mut self, defaults: FindCriteria) -> Self {
        self.defaults = defaults;
        self
    }

    /// Sets how many messages one retrieval attempt fetches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `fetch_limit` is zero, like
    /// [`MailhogConfigBuilder::build`](crate::MailhogConfigBuilder::build).
    pub fn with_fetch_limit(mut self, fetch_limit: usize) -> Result<Self> {
        self.fetch_limit = validate_fetch_limit(fetch_limit)?;
        Ok(self)
    }

    /// Returns the underlying gateway.
    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Returns the client-level default criteria.
    #[must_use]
    pub fn defaults(&self) -> &FindCriteria {
        &self.defaults
    }

    /// Returns all emails matching `criteria`, latest first.
    ///
    /// Retries with the effective retry policy until at least one email matches.
    /// An empty vector means nothing matched within the retry budget; it is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error as soon as MailHog fails a request. Failed requests are never
    /// retried. A [`decode`](FindCriteria::decode) directive never fails the call: a
    /// field that does not decode is returned as is.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mailhog_sync::{FindCriteria, MailhogClient, MailhogConfig};
    ///
    /// # async fn example() -> mailhog_sync::Result<()> {
    /// # let client = MailhogClient::new(MailhogConfig::builder().build()?)?;
    /// let criteria = FindCriteria::new()
    ///     .body("activation code")
    ///     .num_retries(10)
    ///     .retry_delay_ms(200);
    ///
    /// let emails = client.get_all_emails(&criteria).await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(name = "MailhogClient::get_all_emails", skip_all)]
    pub async fn get_all_emails(&self, criteria: &FindCriteria) -> Result<Vec<Email>> {
        let effective = criteria.or(&self.defaults);
        retrieval::retrieve(&self.gateway, &effective, self.fetch_limit).await
    }

    /// Returns the emails sent to `address` that match `criteria`.
    ///
    /// The `to` field of `criteria` is replaced by `address`.
    ///
    /// # Errors
    ///
    /// See [`get_all_emails`](Self::get_all_emails).
    #[instrument(name = "MailhogClient::get_inbox", skip(self, criteria))]
    pub async fn get_inbox(&self, address: &str, criteria: &FindCriteria) -> Result<Vec<Email>> {
        let criteria = criteria.clone().to(address);
        self.get_all_emails(&criteria).await
    }

    /// Returns the emails sent by `address` that match `criteria`.
    ///
    /// The `from` field of `criteria` is replaced by `address`.
    ///
    /// # Errors
    ///
    /// See [`get_all_emails`](Self::get_all_emails).
    #[instrument(name = "MailhogClient::get_emails_for_sender", skip(self, criteria))]
    pub async fn get_emails_for_sender(
        &self,
        address: &str,
        criteria: &FindCriteria,
    ) -> Result<Vec<Email>> {
        let criteria = criteria.clone().from(address);
        self.get_all_emails(&criteria).await
    }

    /// Returns the latest email matching `criteria`, or `None` if nothing matched
    /// within the retry budget.
    ///
    /// # Errors
    ///
    /// See [`get_all_emails`](Self::get_all_emails).
    #[instrument(name = "MailhogClient::get_last_email", skip_all)]
    pub async fn get_last_email(&self, criteria: &FindCriteria) -> Result<Option<Email>> {
        Ok(self.get_all_emails(criteria).await?.into_iter().next())
    }

    /// Deletes one email by id.
    ///
    /// # Errors
    ///
    /// Returns an error if MailHog does not accept the deletion, including an
    /// unknown id.
    #[instrument(name = "MailhogClient::delete_email", skip(self))]
    pub async fn delete_email(&self, id: &str) -> Result<()> {
        self.gateway.delete_message(id).await
    }

    /// Deletes every email matching `criteria`.
    ///
    /// All deletions run concurrently and each one completes before the report is
    /// returned. Individual failures are collected in the report rather than
    /// aborting the batch.
    ///
    /// # Errors
    ///
    /// Returns an error only if retrieving the batch fails.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mailhog_sync::{FindCriteria, MailhogClient, MailhogConfig};
    ///
    /// # async fn example() -> mailhog_sync::Result<()> {
    /// # let client = MailhogClient::new(MailhogConfig::builder().build()?)?;
    /// let report = client
    ///     .delete_emails(&FindCriteria::new().from("noreply@example.com"))
    ///     .await?;
    ///
    /// for failure in &report.failures {
    ///     eprintln!("{}", failure.reason());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(name = "MailhogClient::delete_emails", skip_all)]
    pub async fn delete_emails(&self, criteria: &FindCriteria) -> Result<BatchReport> {
        let emails = self.get_all_emails(criteria).await?;
        let results = join_all(
            emails
                .iter()
                .map(|email| self.gateway.delete_message(&email.id)),
        )
        .await;

        Ok(BatchReport::collect(BatchOperation::Delete, emails, results))
    }

    /// Deletes every email sent to `address`.
    ///
    /// # Errors
    ///
    /// See [`delete_emails`](Self::delete_emails).
    #[instrument(name = "MailhogClient::clear_inbox", skip(self))]
    pub async fn clear_inbox(&self, address: &str) -> Result<BatchReport> {
        self.delete_emails(&FindCriteria::new().to(address)).await
    }

    /// Deletes every email MailHog holds.
    ///
    /// # Errors
    ///
    /// Returns an error if MailHog does not accept the deletion.
    #[instrument(name = "MailhogClient::clear_all_emails", skip(self))]
    pub async fn clear_all_emails(&self) -> Result<()> {
        self.gateway.delete_all().await
    }

    /// Delivers one captured email to the SMTP server described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if MailHog cannot release the message.
    #[instrument(
        name = "MailhogClient::release_email",
        skip(self, config),
        fields(smtp_host = %config.host, smtp_port = config.port)
    )]
    pub async fn release_email(&self, id: &str, config: &ReleaseConfig) -> Result<()> {
        self.gateway.release_message(id, config).await
    }

    /// Delivers every email matching `criteria` to the SMTP server described by
    /// `config`.
    ///
    /// Uses the same fan-out and aggregation as [`delete_emails`](Self::delete_emails).
    ///
    /// # Errors
    ///
    /// Returns an error only if retrieving the batch fails.
    #[instrument(
        name = "MailhogClient::release_emails",
        skip_all,
        fields(smtp_host = %config.host, smtp_port = config.port)
    )]
    pub async fn release_emails(
        &self,
        config: &ReleaseConfig,
        criteria: &FindCriteria,
    ) -> Result<BatchReport> {
        let emails = self.get_all_emails(criteria).await?;
        let results = join_all(
            emails
                .iter()
                .map(|email| self.gateway.release_message(&email.id, config)),
        )
        .await;

        Ok(BatchReport::collect(BatchOperation::Release, emails, results))
    }

    /// Returns the latest email sent by `address`, without retrying.
    ///
    /// # Errors
    ///
    /// Returns an error if the search request fails.
    #[instrument(name = "MailhogClient::latest_from", skip(self))]
    pub async fn latest_from(&self, address: &str) -> Result<Option<Email>> {
        self.latest(address, SearchKind::From).await
    }

    /// Returns the latest email sent to `address`, without retrying.
    ///
    /// # Errors
    ///
    /// Returns an error if the search request fails.
    #[instrument(name = "MailhogClient::latest_to", skip(self))]
    pub async fn latest_to(&self, address: &str) -> Result<Option<Email>> {
        self.latest(address, SearchKind::To).await
    }

    /// Returns the latest email containing `query` anywhere, without retrying.
    ///
    /// # Errors
    ///
    /// Returns an error if the search request fails.
    #[instrument(name = "MailhogClient::latest_containing", skip(self))]
    pub async fn latest_containing(&self, query: &str) -> Result<Option<Email>> {
        self.latest(query, SearchKind::Containing).await
    }

    async fn latest(&self, query: &str, kind: SearchKind) -> Result<Option<Email>> {
        let page = self.gateway.search_messages(query, kind, 0, 1).await?;
        debug!(total = page.total, "Searched for latest email");
        Ok(page.items.into_iter().next())
    }
}

impl<G> fmt::Debug for MailhogClient<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailhogClient")
            .field("defaults", &self.defaults)
            .field("fetch_limit", &self.fetch_limit)
            .finish_non_exhaustive()
    }
}

/// The per-email operation a [`BatchReport`] covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperation {
    /// Deleting messages.
    Delete,
    /// Releasing messages to an SMTP server.
    Release,
}

impl BatchOperation {
    /// Returns the verb used in failure reasons.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BatchOperation::Delete => "delete",
            BatchOperation::Release => "release",
        }
    }
}

impl fmt::Display for BatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a batch delete or release.
///
/// Partial success is a normal outcome: every email that failed is listed in
/// [`failures`](Self::failures), every other attempted email succeeded.
#[derive(Debug)]
#[must_use]
pub struct BatchReport {
    /// Operation applied to each email.
    pub operation: BatchOperation,
    /// Number of emails the operation was applied to.
    pub attempted: usize,
    /// Emails the operation failed for.
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    fn collect(operation: BatchOperation, emails: Vec<Email>, results: Vec<Result<()>>) -> Self {
        let attempted = emails.len();
        let failures: Vec<BatchFailure> = emails
            .into_iter()
            .zip(results)
            .filter_map(|(email, result)| {
                result.err().map(|error| BatchFailure {
                    operation,
                    email,
                    error,
                })
            })
            .collect();

        debug!(
            %operation,
            attempted,
            failed = failures.len(),
            "Batch finished"
        );

        Self {
            operation,
            attempted,
            failures,
        }
    }

    /// Returns `true` if the operation succeeded for every email.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns how many emails the operation succeeded for.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }
}

/// One email a batch operation failed for.
#[derive(Debug)]
pub struct BatchFailure {
    /// Operation that failed.
    pub operation: BatchOperation,
    /// The email as retrieved before the operation.
    pub email: Email,
    /// Why the operation failed.
    pub error: Error,
}

impl BatchFailure {
    /// Returns a diagnostic line naming the message and the cause.
    #[must_use]
    pub fn reason(&self) -> String {
        format!(
            "could not {} message with ID {}: {}",
            self.operation, self.email.id, self.error
        )
    }
}
