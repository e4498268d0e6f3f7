//! OpenTelemetry span attributes, recorded with the `observability` feature.
//!
//! Without the feature these helpers compile to nothing; spans still carry their
//! `tracing` fields.

use crate::error::Error;

/// Tags the current span with the category and retryability of a failed request.
#[cfg(feature = "observability")]
pub(crate) fn record_error(error: &Error) {
    use opentelemetry::Key;
    use tracing_opentelemetry::OpenTelemetrySpanExt;

    let span = tracing::Span::current();
    span.set_attribute(
        Key::from_static_str("mailhog.error.category"),
        error.category().to_string(),
    );
    span.set_attribute(
        Key::from_static_str("mailhog.error.retryable"),
        error.is_retryable(),
    );
}

/// Tags the current span with the category and retryability of a failed request.
#[cfg(not(feature = "observability"))]
pub(crate) fn record_error(_error: &Error) {}
