//! Find criteria and retry parameters for retrieval calls.
//!
//! Every field of [`FindCriteria`] is optional. Values are resolved through a
//! three-tier chain: the criteria passed to a call, then the client-level defaults
//! from [`MailhogConfig`](crate::MailhogConfig), then the [`RetryPolicy::BASELINE`]
//! for the retry parameters. The first tier that sets a field wins.
//!
//! ```
//! use mailhog_sync::{FindCriteria, RetryPolicy};
//! use std::time::Duration;
//!
//! let defaults = FindCriteria::new().num_retries(5).retry_delay_ms(200);
//! let call = FindCriteria::new().to("user@example.com").num_retries(0);
//!
//! let effective = call.or(&defaults);
//! let policy = RetryPolicy::resolve(&effective);
//! assert_eq!(policy.num_retries, 0);
//! assert_eq!(policy.retry_delay, Duration::from_millis(200));
//! ```

use crate::codec::Decoding;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Filters and retry parameters for a retrieval call.
///
/// Build with the chained setters; absent fields impose no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindCriteria {
    /// Only emails whose `from` equals this exactly.
    pub from: Option<String>,
    /// Only emails whose `to` equals this exactly.
    pub to: Option<String>,
    /// Only emails whose `cc` equals this exactly.
    pub cc: Option<String>,
    /// Only emails whose subject contains this.
    pub subject: Option<String>,
    /// Only emails whose content contains this. Resolved by MailHog's search.
    pub body: Option<String>,
    /// Only emails dated strictly before this instant.
    pub before: Option<DateTime<Utc>>,
    /// Only emails dated strictly after this instant.
    pub after: Option<DateTime<Utc>>,
    /// Skip this many matching emails.
    pub offset: Option<usize>,
    /// Return at most this many matching emails.
    pub limit: Option<usize>,
    /// Retries after the first attempt before giving up.
    pub num_retries: Option<u32>,
    /// Delay between attempts.
    pub retry_delay: Option<Duration>,
    /// Decode `subject`, `text` and `html` of the results.
    pub decode: Option<Decoding>,
}

impl FindCriteria {
    /// Creates empty criteria that match every email.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires an exact `from` header.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Requires an exact `to` header.
    #[must_use]
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Requires an exact `cc` header.
    #[must_use]
    pub fn cc(mut self, cc: impl Into<String>) -> Self {
        self.cc = Some(cc.into());
        self
    }

    /// Requires the subject to contain `subject`.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Requires the message to contain `body`.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Requires the email to be dated strictly before `instant`.
    #[must_use]
    pub fn before(mut self, instant: DateTime<Utc>) -> Self {
        self.before = Some(instant);
        self
    }

    /// Requires the email to be dated strictly after `instant`.
    #[must_use]
    pub fn after(mut self, instant: DateTime<Utc>) -> Self {
        self.after = Some(instant);
        self
    }

    /// Skips the first `offset` matching emails.
    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns at most `limit` matching emails.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of retries after the first attempt.
    #[must_use]
    pub fn num_retries(mut self, num_retries: u32) -> Self {
        self.num_retries = Some(num_retries);
        self
    }

    /// Sets the delay between attempts.
    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Sets the delay between attempts in milliseconds.
    #[must_use]
    pub fn retry_delay_ms(self, millis: u64) -> Self {
        self.retry_delay(Duration::from_millis(millis))
    }

    /// Decodes `subject`, `text` and `html` of every result.
    #[must_use]
    pub fn decode(mut self, decoding: Decoding) -> Self {
        self.decode = Some(decoding);
        self
    }

    /// Merges `self` over `fallback`: each field comes from `self` when set, otherwise
    /// from `fallback`.
    #[must_use]
    pub fn or(&self, fallback: &FindCriteria) -> FindCriteria {
        FindCriteria {
            from: first_present(&self.from, &fallback.from),
            to: first_present(&self.to, &fallback.to),
            cc: first_present(&self.cc, &fallback.cc),
            subject: first_present(&self.subject, &fallback.subject),
            body: first_present(&self.body, &fallback.body),
            before: self.before.or(fallback.before),
            after: self.after.or(fallback.after),
            offset: self.offset.or(fallback.offset),
            limit: self.limit.or(fallback.limit),
            num_retries: self.num_retries.or(fallback.num_retries),
            retry_delay: self.retry_delay.or(fallback.retry_delay),
            decode: first_present(&self.decode, &fallback.decode),
        }
    }

    /// Returns the body search string, ignoring an empty one.
    pub(crate) fn body_query(&self) -> Option<&str> {
        self.body.as_deref().filter(|body| !body.is_empty())
    }
}

fn first_present<T: Clone>(primary: &Option<T>, fallback: &Option<T>) -> Option<T> {
    primary.as_ref().or(fallback.as_ref()).cloned()
}

/// Effective retry parameters of a retrieval call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; a call makes `num_retries + 1` attempts.
    pub num_retries: u32,
    /// Delay between attempts.
    pub retry_delay: Duration,
}

impl RetryPolicy {
    /// Values used when neither the call nor the client sets them.
    pub const BASELINE: RetryPolicy = RetryPolicy {
        num_retries: 1,
        retry_delay: Duration::from_millis(500),
    };

    /// Fills the retry parameters missing from `criteria` with [`Self::BASELINE`].
    #[must_use]
    pub fn resolve(criteria: &FindCriteria) -> Self {
        Self {
            num_retries: criteria
                .num_retries
                .unwrap_or(Self::BASELINE.num_retries),
            retry_delay: criteria
                .retry_delay
                .unwrap_or(Self::BASELINE.retry_delay),
        }
    }

    /// Total number of fetch attempts.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        u64::from(self.num_retries) + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::BASELINE
    }
}
