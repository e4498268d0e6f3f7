//! Example: Reach MailHog through an HTTP or SOCKS5 proxy.
//!
//! This is useful when MailHog runs inside a container network or behind a
//! jump host that only exposes a proxy.
//!
//! # Usage
//!
//! ```bash
//! export MAILHOG_URL="http://mailhog:8025"
//! export PROXY_HOST="proxy.example.com"
//! export PROXY_PORT="1080"
//! # Optional: "http" (default is socks5)
//! export PROXY_SCHEME="socks5"
//! # Optional: for authenticated proxies
//! export PROXY_USER="username"
//! export PROXY_PASS="password"
//!
//! cargo run --example with_proxy
//! ```

use mailhog_sync::{FindCriteria, MailhogClient, MailhogConfig, Proxy};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> mailhog_sync::Result<()> {
    let url = env::var("MAILHOG_URL").expect("MAILHOG_URL environment variable required");

    // Proxy configuration
    let proxy_host = env::var("PROXY_HOST").expect("PROXY_HOST environment variable required");
    let proxy_port: u16 = env::var("PROXY_PORT")
        .expect("PROXY_PORT environment variable required")
        .parse()
        .expect("PROXY_PORT must be a valid port number");

    let mut proxy = match env::var("PROXY_SCHEME").as_deref() {
        Ok("http") => Proxy::http(&proxy_host, proxy_port),
        _ => Proxy::socks5(&proxy_host, proxy_port),
    };
    if let (Ok(user), Ok(pass)) = (env::var("PROXY_USER"), env::var("PROXY_PASS")) {
        proxy = proxy.with_auth(user, pass);
    }
    println!("Using proxy {}", proxy);

    let config = MailhogConfig::builder()
        .base_url(&url)
        .proxy(proxy)
        // Increase timeouts for proxy connections
        .connect_timeout(Duration::from_secs(60))
        .request_timeout(Duration::from_secs(60))
        .build()?;

    let client = MailhogClient::new(config)?;

    let emails = client
        .get_all_emails(&FindCriteria::new().limit(10).num_retries(0))
        .await?;

    println!("Latest {} email(s) on {}:", emails.len(), url);
    for email in emails {
        println!("  {} | {}", email.to, email.subject);
    }

    Ok(())
}
