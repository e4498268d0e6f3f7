//! Example: Find an activation email by its body and decode it.
//!
//! A body constraint is resolved by MailHog's search endpoint, then the
//! remaining criteria are applied locally. Set `BODY_ENCODING` when the
//! application under test puts encoded content in the body.
//!
//! # Usage
//!
//! ```bash
//! export MAILHOG_URL="http://localhost:8025"
//! export BODY_QUERY="/activate/"
//! # Optional: base64 or quoted-printable
//! export BODY_ENCODING="quoted-printable"
//! cargo run --example search_body
//! ```

use mailhog_sync::{Decoding, Encoding, FindCriteria, MailhogClient, MailhogConfig};
use std::env;

#[tokio::main]
async fn main() -> mailhog_sync::Result<()> {
    let url = env::var("MAILHOG_URL").unwrap_or_else(|_| "http://localhost:8025".to_string());
    let query = env::var("BODY_QUERY").expect("BODY_QUERY environment variable required");

    let client = MailhogClient::new(MailhogConfig::builder().base_url(url).build()?)?;

    let mut criteria = FindCriteria::new()
        .body(&query)
        .limit(5)
        .num_retries(10)
        .retry_delay_ms(500);

    if let Ok(name) = env::var("BODY_ENCODING") {
        let encoding: Encoding = name.parse()?;
        println!("Decoding results as {}", encoding);
        criteria = criteria.decode(Decoding::new(encoding));
    }

    let emails = client.get_all_emails(&criteria).await?;
    println!("{} email(s) contain {:?}", emails.len(), query);

    for email in emails {
        println!("\n--- {} ({}) ---", email.subject, email.id);
        println!("{}", email.text);
    }

    // Peek without retrying
    match client.latest_containing(&query).await? {
        Some(email) => println!("\nLatest match: {}", email.id),
        None => println!("\nNo match right now"),
    }

    Ok(())
}
