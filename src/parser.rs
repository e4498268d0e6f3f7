//! Internal module for turning MailHog API responses into [`Email`] values.

use crate::error::{Error, Result};
use crate::model::{Attachment, Email, MessagesPage};
use chrono::{DateTime, Utc};
use mailparse::body::Body;
use mailparse::{parse_mail, DispositionType, MailHeaderMap, ParsedMail};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Envelope of `/api/v2/messages` and `/api/v2/search`.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    count: usize,
    #[serde(default)]
    start: usize,
    #[serde(default)]
    items: Option<Vec<RawMessage>>,
}

/// A message as MailHog stores it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawMessage {
    #[serde(rename = "ID")]
    id: String,
    #[serde(default)]
    created: Option<DateTime<Utc>>,
    #[serde(default)]
    content: Option<RawContent>,
    #[serde(default)]
    raw: Option<RawData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawContent {
    #[serde(default)]
    headers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawData {
    #[serde(default)]
    data: String,
}

impl RawMessage {
    /// Returns the RFC 5322 source, rebuilding it from the parsed content when
    /// MailHog did not keep the raw data.
    fn source(&self) -> String {
        if let Some(raw) = self.raw.as_ref().filter(|raw| !raw.data.is_empty()) {
            return raw.data.clone();
        }

        let Some(content) = &self.content else {
            return String::new();
        };

        let mut source = String::new();
        for (name, values) in &content.headers {
            for value in values {
                source.push_str(name);
                source.push_str(": ");
                source.push_str(value);
                source.push_str("\r\n");
            }
        }
        source.push_str("\r\n");
        source.push_str(&content.body);
        source
    }
}

/// Parses a messages envelope, skipping items whose content cannot be parsed.
pub(crate) fn parse_page(bytes: &[u8], operation: &'static str) -> Result<MessagesPage> {
    let response: MessagesResponse =
        serde_json::from_slice(bytes).map_err(|source| Error::ResponseParse { operation, source })?;

    let items: Vec<Email> = response
        .items
        .unwrap_or_default()
        .into_iter()
        .filter_map(into_email)
        .collect();

    debug!(
        operation,
        total = response.total,
        count = response.count,
        parsed = items.len(),
        "Parsed messages page"
    );

    Ok(MessagesPage {
        total: response.total,
        count: response.count,
        start: response.start,
        items,
    })
}

/// Converts one stored message into an [`Email`].
///
/// A message that cannot be parsed is logged and skipped rather than failing the
/// whole page: it could never satisfy any criteria anyway.
fn into_email(message: RawMessage) -> Option<Email> {
    let source = message.source();
    let parsed = match parse_mail(source.as_bytes()) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(id = %message.id, error = %e, "Failed to parse message, skipping");
            return None;
        }
    };

    let created = message.created.unwrap_or_default();
    let headers = &parsed.headers;

    let mut content = BodyParts::default();
    if let Err(e) = content.collect(&parsed) {
        warn!(id = %message.id, error = %e, "Failed to extract message body, skipping");
        return None;
    }

    Some(Email {
        from: joined(headers, "From"),
        to: joined(headers, "To"),
        cc: joined(headers, "Cc"),
        bcc: joined(headers, "Bcc"),
        reply_to: joined(headers, "Reply-To"),
        subject: headers.get_first_value("Subject").unwrap_or_default(),
        text: content.text.unwrap_or_default(),
        html: content.html.unwrap_or_default(),
        date: header_date(headers, "Date").unwrap_or(created),
        delivery_date: header_date(headers, "Delivery-Date").unwrap_or(created),
        attachments: content.attachments,
        id: message.id,
    })
}

/// Joins every occurrence of an address header, e.g. two `To` lines.
fn joined(headers: &[mailparse::MailHeader<'_>], name: &str) -> String {
    headers.get_all_values(name).join(", ")
}

fn header_date(headers: &[mailparse::MailHeader<'_>], name: &str) -> Option<DateTime<Utc>> {
    let value = headers.get_first_value(name)?;
    let timestamp = mailparse::dateparse(&value).ok()?;
    DateTime::from_timestamp(timestamp, 0)
}

/// Text, HTML and attachments collected from a MIME tree.
#[derive(Debug, Default)]
struct BodyParts {
    text: Option<String>,
    html: Option<String>,
    attachments: Vec<Attachment>,
}

impl BodyParts {
    fn collect(&mut self, part: &ParsedMail<'_>) -> std::result::Result<(), mailparse::MailParseError> {
        if !part.subparts.is_empty() {
            for subpart in &part.subparts {
                self.collect(subpart)?;
            }
            return Ok(());
        }

        let disposition = part.get_content_disposition();
        let filename = disposition
            .params
            .get("filename")
            .or_else(|| part.ctype.params.get("name"))
            .cloned();

        if disposition.disposition == DispositionType::Attachment || filename.is_some() {
            self.attachments.push(Attachment {
                name: filename.unwrap_or_default(),
                content_type: part.ctype.mimetype.clone(),
                encoding: part
                    .headers
                    .get_first_value("Content-Transfer-Encoding")
                    .unwrap_or_else(|| "7bit".to_string()),
                body: encoded_body(part),
            });
            return Ok(());
        }

        match part.ctype.mimetype.to_lowercase().as_str() {
            "text/plain" if self.text.is_none() => self.text = Some(part.get_body()?),
            "text/html" if self.html.is_none() => self.html = Some(part.get_body()?),
            _ => {}
        }
        Ok(())
    }
}

/// Returns the body exactly as transmitted, without undoing its transfer encoding.
fn encoded_body(part: &ParsedMail<'_>) -> String {
    let body = part.get_body_encoded();
    let raw = match &body {
        Body::Base64(encoded) | Body::QuotedPrintable(encoded) => encoded.get_raw(),
        Body::SevenBit(text) | Body::EightBit(text) => text.get_raw(),
        Body::Binary(binary) => binary.get_raw(),
    };
    String::from_utf8_lossy(raw).trim_end().to_string()
}
