//! Example: Using tracing for observability.
//!
//! This example demonstrates how to enable structured logging using
//! the `tracing` ecosystem. Every client operation, each retrieval attempt
//! and every MailHog request emit tracing spans and events.
//!
//! # Usage
//!
//! ```bash
//! export MAILHOG_URL="http://localhost:8025"
//! export INBOX_ADDRESS="user@example.com"
//! # Set log level (trace, debug, info, warn, error)
//! export RUST_LOG=mailhog_sync=debug
//!
//! cargo run --example with_tracing
//! ```

use mailhog_sync::{FindCriteria, MailhogClient, MailhogConfig};
use std::env;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> mailhog_sync::Result<()> {
    // Use RUST_LOG to control log levels, e.g. RUST_LOG=mailhog_sync=debug,info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mailhog_sync=debug")),
        )
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let url = env::var("MAILHOG_URL").unwrap_or_else(|_| "http://localhost:8025".to_string());
    let address = env::var("INBOX_ADDRESS").expect("INBOX_ADDRESS environment variable required");

    tracing::info!(%url, "Starting mailhog-sync example");

    let config = MailhogConfig::builder()
        .base_url(url)
        .num_retries(5)
        .retry_delay_ms(500)
        .build()?;
    let client = MailhogClient::new(config)?;

    // Each attempt logs how many messages were fetched and matched
    let inbox = client.get_inbox(&address, &FindCriteria::new()).await?;
    tracing::info!(count = inbox.len(), "Retrieved inbox");

    // A batch delete logs one warning per failed message
    let report = client.clear_inbox(&address).await?;
    tracing::info!(
        attempted = report.attempted,
        failed = report.failures.len(),
        "Cleared inbox"
    );

    Ok(())
}
