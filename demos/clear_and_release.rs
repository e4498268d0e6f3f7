//! Example: Release captured emails to a real SMTP server, then clean up.
//!
//! # Usage
//!
//! ```bash
//! export MAILHOG_URL="http://localhost:8025"
//! export SENDER_ADDRESS="noreply@example.com"
//! export SMTP_HOST="smtp.example.com"
//! export SMTP_PORT="587"
//! export RELEASE_TO="qa-archive@example.com"
//! # Optional: SMTP credentials
//! export SMTP_USER="relay"
//! export SMTP_PASS="secret"
//! cargo run --example clear_and_release
//! ```

use mailhog_sync::{AuthMechanism, FindCriteria, MailhogClient, MailhogConfig, ReleaseConfig};
use std::env;

#[tokio::main]
async fn main() -> mailhog_sync::Result<()> {
    let url = env::var("MAILHOG_URL").unwrap_or_else(|_| "http://localhost:8025".to_string());
    let sender = env::var("SENDER_ADDRESS").expect("SENDER_ADDRESS environment variable required");
    let smtp_host = env::var("SMTP_HOST").expect("SMTP_HOST environment variable required");
    let smtp_port: u16 = env::var("SMTP_PORT")
        .unwrap_or_else(|_| "25".to_string())
        .parse()
        .expect("SMTP_PORT must be a valid port number");
    let release_to = env::var("RELEASE_TO").expect("RELEASE_TO environment variable required");

    let client = MailhogClient::new(MailhogConfig::builder().base_url(url).build()?)?;

    let mut release = ReleaseConfig::new(smtp_host, smtp_port, &release_to)?;
    if let (Ok(user), Ok(pass)) = (env::var("SMTP_USER"), env::var("SMTP_PASS")) {
        release = release
            .credentials(user, pass)
            .mechanism(AuthMechanism::Plain);
    }
    println!("Releasing to {:?}", release);

    let criteria = FindCriteria::new().from(&sender).num_retries(0);

    let report = client.release_emails(&release, &criteria).await?;
    println!(
        "Released {}/{} email(s) from {}",
        report.succeeded(),
        report.attempted,
        sender
    );
    for failure in &report.failures {
        eprintln!("  {}", failure.reason());
    }

    let report = client.delete_emails(&criteria).await?;
    println!("Deleted {}/{} email(s)", report.succeeded(), report.attempted);
    for failure in &report.failures {
        eprintln!("  {}", failure.reason());
    }

    Ok(())
}
