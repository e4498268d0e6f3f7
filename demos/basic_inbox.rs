//! Example: Wait for an email in a recipient's inbox.
//!
//! Send a message to MailHog's SMTP port first, for example with
//! `swaks --to user@example.com --server localhost:1025 --header "Subject: Welcome"`.
//!
//! # Usage
//!
//! ```bash
//! export MAILHOG_URL="http://localhost:8025"
//! export INBOX_ADDRESS="user@example.com"
//! cargo run --example basic_inbox
//! ```

use mailhog_sync::{FindCriteria, MailhogClient, MailhogConfig};
use std::env;

#[tokio::main]
async fn main() -> mailhog_sync::Result<()> {
    let url = env::var("MAILHOG_URL").unwrap_or_else(|_| "http://localhost:8025".to_string());
    let address = env::var("INBOX_ADDRESS").expect("INBOX_ADDRESS environment variable required");

    let config = MailhogConfig::builder()
        .base_url(&url)
        .num_retries(20)
        .retry_delay_ms(250)
        .build()?;
    let client = MailhogClient::new(config)?;

    println!("Waiting for emails to {} on {}...", address, url);

    let inbox = client.get_inbox(&address, &FindCriteria::new()).await?;
    if inbox.is_empty() {
        println!("Nothing arrived within the retry budget.");
        return Ok(());
    }

    for email in &inbox {
        println!(
            "[{}] {} -> {}: {}",
            email.date, email.from, email.to, email.subject
        );
        if !email.attachments.is_empty() {
            println!("  {} attachment(s)", email.attachments.len());
        }
    }

    Ok(())
}
