//! Captured email values as returned by MailHog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A snapshot of a captured message at fetch time.
///
/// Header fields hold the decoded header text. Address headers are not split into
/// individual recipients; a message sent to two addresses has a `to` of
/// `"a@example.com, b@example.com"` and only matches that exact string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    /// Identifier assigned by MailHog.
    pub id: String,
    /// Decoded `From` header.
    pub from: String,
    /// Decoded `To` header.
    pub to: String,
    /// Decoded `Cc` header.
    pub cc: String,
    /// Decoded `Bcc` header.
    pub bcc: String,
    /// Decoded `Reply-To` header.
    pub reply_to: String,
    /// Decoded `Subject` header.
    pub subject: String,
    /// Plain text body.
    pub text: String,
    /// HTML body.
    pub html: String,
    /// `Date` header, or the capture time if the header is missing.
    pub date: DateTime<Utc>,
    /// `Delivery-Date` header, or the capture time if the header is missing.
    pub delivery_date: DateTime<Utc>,
    /// Attachments in the order they appear in the message.
    pub attachments: Vec<Attachment>,
}

/// An attachment of a captured message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Filename.
    pub name: String,
    /// `Content-Type`, e.g. `application/pdf`.
    #[serde(rename = "type")]
    pub content_type: String,
    /// `Content-Transfer-Encoding`, e.g. `base64`.
    pub encoding: String,
    /// Body as transmitted, still transfer-encoded.
    pub body: String,
}

/// One page of messages from MailHog, sorted from latest to earliest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagesPage {
    /// Number of messages MailHog holds for the query.
    pub total: usize,
    /// Number of messages in this page.
    pub count: usize,
    /// Offset of the first message in this page.
    pub start: usize,
    /// The messages.
    pub items: Vec<Email>,
}
