//! Example: Proper error handling with retries.
//!
//! The client only retries while waiting for delivery; a MailHog that
//! cannot be reached fails the call immediately. This example shows how to
//! add your own retry on top, based on error retryability.
//!
//! # Usage
//!
//! ```bash
//! export MAILHOG_URL="http://localhost:8025"
//! cargo run --example error_handling
//! ```

use mailhog_sync::{Email, Error, ErrorCategory, FindCriteria, MailhogClient, MailhogConfig};
use std::env;
use std::time::Duration;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Retrieves with automatic retry for transient request failures
async fn retrieve_with_retry(
    client: &MailhogClient,
    criteria: &FindCriteria,
) -> Result<Vec<Email>, Error> {
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt = 1;

    loop {
        println!("Request attempt {}/{}...", attempt, MAX_RETRIES);

        match client.get_all_emails(criteria).await {
            Ok(emails) => return Ok(emails),
            Err(e) => {
                println!("  Error: {}", e);
                println!("  Category: {}", e.category());
                println!("  Retryable: {}", e.is_retryable());

                if !e.is_retryable() || attempt >= MAX_RETRIES {
                    return Err(e);
                }

                println!("  Retrying in {:?}...", backoff);
                tokio::time::sleep(backoff).await;
                backoff *= 2; // Exponential backoff
                attempt += 1;
            }
        }
    }
}

fn explain(error: &Error) {
    match error.category() {
        ErrorCategory::Network => {
            println!("MailHog is unreachable: is it running? {}", error);
        }
        ErrorCategory::Protocol => {
            // Non-success status, e.g. a wrong base path or failing basic auth
            println!("MailHog rejected the request: {}", error);
        }
        ErrorCategory::Parse => {
            println!("Response was not MailHog JSON: {}", error);
        }
        ErrorCategory::Decode => {
            println!("A result field could not be decoded: {}", error);
        }
        ErrorCategory::Configuration => {
            println!("Configuration error, fix it and rerun: {}", error);
        }
    }
}

#[tokio::main]
async fn main() {
    let url = env::var("MAILHOG_URL").unwrap_or_else(|_| "http://localhost:8025".to_string());

    println!("mailhog-sync - Error Handling Example\n");
    println!("=====================================\n");

    let config = match MailhogConfig::builder()
        .base_url(&url)
        .connect_timeout(Duration::from_secs(2))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("This error is NOT retryable - fix your configuration");
            std::process::exit(1);
        }
    };

    let client = match MailhogClient::new(config) {
        Ok(c) => c,
        Err(e) => {
            explain(&e);
            std::process::exit(1);
        }
    };

    let criteria = FindCriteria::new().subject("Welcome").num_retries(2);

    match retrieve_with_retry(&client, &criteria).await {
        // Nothing found is an empty result, not an error
        Ok(emails) if emails.is_empty() => println!("\nNo welcome email arrived"),
        Ok(emails) => println!("\nFound {} welcome email(s)", emails.len()),
        Err(e) => {
            eprintln!("\nFailed after {} attempts", MAX_RETRIES);
            explain(&e);
        }
    }

    println!("Done!");
}
