//! Transfer-encoding helpers for email content.
//!
//! MailHog stores bodies exactly as they were sent, so a test that sends base64 or
//! quoted-printable content usually wants to read it back decoded. [`decode`] and
//! [`encode`] convert between a transfer encoding and text in a given charset, and a
//! [`Decoding`] directive on [`FindCriteria`](crate::FindCriteria) applies [`decode`]
//! to every retrieved email.
//!
//! # Strict and lenient decoding
//!
//! [`decode`] and [`Decoding::apply`] are strict: malformed base64, a malformed
//! quoted-printable escape, or bytes that are not valid in the charset return an
//! error. Retrieval uses [`Decoding::apply_or_keep`] instead, which never fails: a
//! field that does not decode strictly keeps its original value. An email with a
//! plain subject and an encoded body therefore comes back with only the body
//! decoded.
//!
//! # Example
//!
//! ```
//! use mailhog_sync::codec::{decode, encode, Encoding};
//!
//! let encoded = encode("Grüße", Encoding::QuotedPrintable, None, None).unwrap();
//! assert_eq!(encoded, "Gr=C3=BC=C3=9Fe");
//! assert_eq!(decode(&encoded, Encoding::QuotedPrintable, None).unwrap(), "Grüße");
//! ```

use crate::error::{Error, Result};
use base64::Engine;
use std::fmt;
use std::str::FromStr;

/// Charset used when none is given.
pub const DEFAULT_CHARSET: &str = "utf8";

/// Soft line break limit used when none is given.
pub const DEFAULT_LINE_LENGTH: usize = 76;

/// Content transfer encodings understood by [`decode`] and [`encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// `base64`
    Base64,
    /// `quoted-printable`
    QuotedPrintable,
}

impl Encoding {
    /// Returns the MIME name of this encoding.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Base64 => "base64",
            Encoding::QuotedPrintable => "quoted-printable",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base64" => Ok(Encoding::Base64),
            "quoted-printable" => Ok(Encoding::QuotedPrintable),
            _ => Err(Error::UnknownEncoding {
                encoding: s.to_string(),
            }),
        }
    }
}

/// A decode directive: which transfer encoding to undo and which charset the
/// resulting bytes are in.
///
/// # Example
///
/// ```
/// use mailhog_sync::codec::{Decoding, Encoding};
///
/// let decoding = Decoding::new(Encoding::Base64).charset("iso-8859-1");
/// assert_eq!(decoding.apply("R3L832U=").unwrap(), "Grüße");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoding {
    /// The transfer encoding to undo.
    pub encoding: Encoding,
    /// Charset of the decoded bytes (default: `utf8`).
    pub charset: Option<String>,
}

impl Decoding {
    /// Creates a directive for the given encoding with the default charset.
    #[must_use]
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            charset: None,
        }
    }

    /// Sets the charset of the decoded bytes.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Decodes `text` according to this directive.
    ///
    /// # Errors
    ///
    /// See [`decode`].
    pub fn apply(&self, text: &str) -> Result<String> {
        decode(text, self.encoding, self.charset.as_deref())
    }

    /// Decodes `text` according to this directive, or returns it unchanged if it
    /// does not decode.
    #[must_use]
    pub fn apply_or_keep(&self, text: &str) -> String {
        self.apply(text).unwrap_or_else(|_| text.to_string())
    }
}

/// Decodes `text` from `encoding` and interprets the bytes in `charset`
/// (default: `utf8`).
///
/// Base64 input may contain line breaks. Quoted-printable input is decoded in robust
/// mode, so stray `=` signs survive as literal characters.
///
/// # Errors
///
/// Returns [`Error::UnknownCharset`] for an unknown charset label,
/// [`Error::Base64`] / [`Error::QuotedPrintable`] for malformed input, or
/// [`Error::MalformedCharset`] if the decoded bytes are not valid in the charset.
pub fn decode(text: &str, encoding: Encoding, charset: Option<&str>) -> Result<String> {
    let target = resolve_charset(charset)?;

    let bytes = match encoding {
        Encoding::Base64 => {
            let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|source| Error::Base64 { source })?
        }
        Encoding::QuotedPrintable => {
            quoted_printable::decode(text, quoted_printable::ParseMode::Robust)
                .map_err(|source| Error::QuotedPrintable { source })?
        }
    };

    target
        .decode_without_bom_handling_and_without_replacement(&bytes)
        .map(std::borrow::Cow::into_owned)
        .ok_or_else(|| Error::MalformedCharset {
            charset: target.name().to_string(),
        })
}

/// Encodes `text` into `charset` (default: `utf8`) and then into `encoding`,
/// wrapping lines at `line_length` characters (default: 76).
///
/// Base64 lines are separated by CRLF; a `line_length` of 0 disables wrapping.
/// Quoted-printable lines are broken with `=` soft line breaks.
///
/// # Errors
///
/// Returns [`Error::UnknownCharset`] for an unknown charset label, or
/// [`Error::InvalidConfig`] if a quoted-printable `line_length` is too short to
/// hold an escape sequence plus a soft line break.
pub fn encode(
    text: &str,
    encoding: Encoding,
    charset: Option<&str>,
    line_length: Option<usize>,
) -> Result<String> {
    let target = resolve_charset(charset)?;
    let line_length = line_length.unwrap_or(DEFAULT_LINE_LENGTH);
    let (bytes, _, _) = target.encode(text);

    match encoding {
        Encoding::Base64 => {
            let flat = base64::engine::general_purpose::STANDARD.encode(bytes);
            Ok(wrap_base64(&flat, line_length))
        }
        Encoding::QuotedPrintable => {
            if line_length < 4 {
                return Err(Error::InvalidConfig {
                    message: format!(
                        "quoted-printable line length must be at least 4, got {line_length}"
                    ),
                });
            }
            let encoded = quoted_printable::encode_to_str(bytes);
            Ok(refold_quoted_printable(&encoded, line_length))
        }
    }
}

fn resolve_charset(charset: Option<&str>) -> Result<&'static encoding_rs::Encoding> {
    let label = charset.unwrap_or(DEFAULT_CHARSET);
    encoding_rs::Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
        Error::UnknownCharset {
            charset: label.to_string(),
        }
    })
}

fn wrap_base64(flat: &str, line_length: usize) -> String {
    if line_length == 0 || flat.len() <= line_length {
        return flat.to_string();
    }

    // Base64 output is ASCII, so byte chunks are char boundaries.
    flat.as_bytes()
        .chunks(line_length)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// Re-wraps quoted-printable output so no line exceeds `line_length`.
fn refold_quoted_printable(encoded: &str, line_length: usize) -> String {
    // Undo the encoder's own soft breaks to recover the logical lines.
    let mut logical: Vec<String> = Vec::new();
    let mut current = String::new();
    for segment in encoded.split("\r\n") {
        if let Some(continued) = segment.strip_suffix('=') {
            current.push_str(continued);
        } else {
            current.push_str(segment);
            logical.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        logical.push(current);
    }

    logical
        .iter()
        .map(|line| fold_line(line, line_length))
        .collect::<Vec<_>>()
        .join("\r\n")
}

fn fold_line(line: &str, line_length: usize) -> String {
    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len() + line.len() / line_length * 3);
    let mut width = 0;
    let mut i = 0;

    while i < bytes.len() {
        let remaining = bytes.len() - i;
        if width + remaining <= line_length {
            out.push_str(&line[i..]);
            break;
        }

        // An escape sequence is never split across lines.
        let unit = if bytes[i] == b'=' { remaining.min(3) } else { 1 };
        if width + unit > line_length - 1 {
            out.push_str("=\r\n");
            width = 0;
        }
        out.push_str(&line[i..i + unit]);
        width += unit;
        i += unit;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("base64".parse::<Encoding>().unwrap(), Encoding::Base64);
        assert_eq!(
            "Quoted-Printable".parse::<Encoding>().unwrap(),
            Encoding::QuotedPrintable
        );
        assert!(matches!(
            "uuencode".parse::<Encoding>(),
            Err(Error::UnknownEncoding { .. })
        ));
    }

    #[test]
    fn test_decode_base64_with_line_breaks() {
        let text = "SGVsbG8s\r\nIHdvcmxk\r\nIQ==";
        assert_eq!(decode(text, Encoding::Base64, None).unwrap(), "Hello, world!");
    }

    #[test]
    fn test_decode_quoted_printable_utf8() {
        let text = "Passwort zur=C3=BCcksetzen=\r\n angefordert";
        assert_eq!(
            decode(text, Encoding::QuotedPrintable, Some("utf-8")).unwrap(),
            "Passwort zurücksetzen angefordert"
        );
    }

    #[test]
    fn test_decode_with_latin1_charset() {
        // 0xFC is 'ü' in ISO-8859-1
        assert_eq!(
            decode("zur=FCck", Encoding::QuotedPrintable, Some("iso-8859-1")).unwrap(),
            "zurück"
        );
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(matches!(
            decode("not base64!!", Encoding::Base64, None),
            Err(Error::Base64 { .. })
        ));
        assert!(matches!(
            decode("abc", Encoding::Base64, Some("no-such-charset")),
            Err(Error::UnknownCharset { .. })
        ));
    }

    #[test]
    fn test_encode_base64_wraps_lines() {
        let text = "a".repeat(100);
        let encoded = encode(&text, Encoding::Base64, None, Some(20)).unwrap();
        let lines: Vec<&str> = encoded.split("\r\n").collect();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| line.len() <= 20));
        assert_eq!(decode(&encoded, Encoding::Base64, None).unwrap(), text);

        let unwrapped = encode(&text, Encoding::Base64, None, Some(0)).unwrap();
        assert!(!unwrapped.contains("\r\n"));
    }

    #[test]
    fn test_encode_quoted_printable_respects_line_length() {
        let text = "é".repeat(40);
        let encoded = encode(&text, Encoding::QuotedPrintable, None, Some(20)).unwrap();
        for line in encoded.split("\r\n") {
            assert!(line.len() <= 20, "line too long: {line}");
        }
        assert_eq!(
            decode(&encoded, Encoding::QuotedPrintable, None).unwrap(),
            text
        );
    }

    #[test]
    fn test_encode_quoted_printable_rejects_tiny_line_length() {
        assert!(matches!(
            encode("x", Encoding::QuotedPrintable, None, Some(3)),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_bytes_invalid_in_charset() {
        // 0xFF never appears in UTF-8
        assert!(matches!(
            decode("/w==", Encoding::Base64, None),
            Err(Error::MalformedCharset { .. })
        ));
        assert_eq!(
            decode("/w==", Encoding::Base64, Some("iso-8859-1")).unwrap(),
            "ÿ"
        );
    }

    #[test]
    fn test_apply_or_keep_leaves_undecodable_text() {
        let decoding = Decoding::new(Encoding::Base64);
        assert_eq!(decoding.apply_or_keep("SGVsbG8="), "Hello");
        assert_eq!(
            decoding.apply_or_keep("Reset your password"),
            "Reset your password"
        );
        assert_eq!(decoding.apply_or_keep("/w=="), "/w==");
        assert_eq!(decoding.apply_or_keep(""), "");
    }

    #[test]
    fn test_decoding_directive() {
        let decoding = Decoding::new(Encoding::Base64);
        assert_eq!(decoding.apply("UmVzZXQ=").unwrap(), "Reset");
        assert_eq!(decoding.charset, None);
    }
}
