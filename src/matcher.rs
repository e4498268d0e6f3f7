//! Deciding whether a captured email satisfies a set of [`FindCriteria`].
//!
//! All present constraints must hold; absent or empty constraints impose no
//! restriction. Address headers compare by exact string equality, the subject by
//! case-sensitive substring containment, and dates by strict bounds.
//!
//! The `body` constraint is not checked here. It selects MailHog's server-side search
//! instead, so the batch handed to [`matches`] is already narrowed by content.
//!
//! # Example
//!
//! ```
//! use mailhog_sync::matcher::matches;
//! use mailhog_sync::{Email, FindCriteria};
//! use chrono::{TimeZone, Utc};
//!
//! let sent = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
//! let email = Email {
//!     id: "1".into(),
//!     from: "system@example.com".into(),
//!     to: "user@example.com".into(),
//!     cc: String::new(),
//!     bcc: String::new(),
//!     reply_to: String::new(),
//!     subject: "Reset your password".into(),
//!     text: String::new(),
//!     html: String::new(),
//!     date: sent,
//!     delivery_date: sent,
//!     attachments: Vec::new(),
//! };
//!
//! assert!(matches(&email, &FindCriteria::new().to("user@example.com").subject("Reset")));
//! assert!(!matches(&email, &FindCriteria::new().subject("reset")));
//! ```

use crate::criteria::FindCriteria;
use crate::model::Email;

/// Returns `true` if `email` satisfies every filter constraint in `criteria`.
#[must_use]
pub fn matches(email: &Email, criteria: &FindCriteria) -> bool {
    if !equals(&email.from, criteria.from.as_deref()) {
        return false;
    }
    if !equals(&email.to, criteria.to.as_deref()) {
        return false;
    }
    if !equals(&email.cc, criteria.cc.as_deref()) {
        return false;
    }

    if let Some(before) = criteria.before {
        if email.date >= before {
            return false;
        }
    }
    if let Some(after) = criteria.after {
        if email.date <= after {
            return false;
        }
    }

    match criteria.subject.as_deref() {
        Some(subject) if !subject.is_empty() => email.subject.contains(subject),
        _ => true,
    }
}

fn equals(field: &str, constraint: Option<&str>) -> bool {
    match constraint {
        Some(expected) if !expected.is_empty() => field == expected,
        _ => true,
    }
}
