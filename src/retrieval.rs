//! Retrieval engine: fetch, filter and retry until matching emails show up.
//!
//! SMTP delivery races the HTTP assertion in a test, so an email that was just sent
//! may not be visible in MailHog yet. Each attempt fetches one bounded batch,
//! narrows it with [`matches`], and returns as soon as anything matches. Between
//! attempts the engine sleeps for the retry delay; that sleep is its only suspension
//! point, so wrapping a call in `tokio::time::timeout` cancels it cleanly.
//!
//! Gateway errors end the retrieval immediately. The retry budget is for messages
//! that have not arrived, not for a MailHog that cannot be reached.

use crate::codec::Decoding;
use crate::criteria::{FindCriteria, RetryPolicy};
use crate::error::Result;
use crate::gateway::{Gateway, SearchKind};
use crate::matcher::matches;
use crate::model::Email;
use tracing::{debug, instrument};

/// Runs up to `num_retries + 1` fetch-and-filter attempts for `criteria`.
///
/// `criteria` must already be merged with the client-level defaults. Returns an
/// empty vector when no attempt found a match.
#[instrument(
    name = "retrieval::retrieve",
    skip_all,
    fields(
        body_search = criteria.body_query().is_some(),
        fetch_limit = fetch_limit
    )
)]
pub(crate) async fn retrieve<G: Gateway>(
    gateway: &G,
    criteria: &FindCriteria,
    fetch_limit: usize,
) -> Result<Vec<Email>> {
    let policy = RetryPolicy::resolve(criteria);
    let attempts = policy.attempts();

    for attempt in 0..attempts {
        let batch = fetch_batch(gateway, criteria, fetch_limit).await?;
        let fetched = batch.len();

        let found: Vec<Email> = batch
            .into_iter()
            .filter(|email| matches(email, criteria))
            .collect();

        debug!(attempt, fetched, matched = found.len(), "Attempt finished");

        if !found.is_empty() {
            let mut found = window(found, criteria.offset, criteria.limit);
            if let Some(decoding) = &criteria.decode {
                decode_fields(&mut found, decoding);
            }
            return Ok(found);
        }

        if attempt + 1 < attempts && !policy.retry_delay.is_zero() {
            debug!(
                delay_ms = u64::try_from(policy.retry_delay.as_millis()).unwrap_or(u64::MAX),
                "No match yet, waiting before next attempt"
            );
            tokio::time::sleep(policy.retry_delay).await;
        }
    }

    debug!(attempts, "No matching email after all attempts");
    Ok(Vec::new())
}

/// Fetches one batch, through MailHog's search when a body query is set.
async fn fetch_batch<G: Gateway>(
    gateway: &G,
    criteria: &FindCriteria,
    fetch_limit: usize,
) -> Result<Vec<Email>> {
    let page = match criteria.body_query() {
        Some(body) => {
            gateway
                .search_messages(body, SearchKind::Containing, 0, fetch_limit)
                .await?
        }
        None => gateway.list_messages(0, fetch_limit).await?,
    };
    Ok(page.items)
}

fn window(found: Vec<Email>, offset: Option<usize>, limit: Option<usize>) -> Vec<Email> {
    found
        .into_iter()
        .skip(offset.unwrap_or(0))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Decodes `subject`, `text` and `html` of the retrieved copies in place. A field
/// that does not decode keeps its value.
fn decode_fields(emails: &mut [Email], decoding: &Decoding) {
    for email in emails {
        for (field, value) in [
            ("subject", &mut email.subject),
            ("text", &mut email.text),
            ("html", &mut email.html),
        ] {
            let decoded = decoding.apply_or_keep(value);
            if !value.is_empty() && decoded == *value {
                debug!(id = %email.id, field, "Field left as is");
            }
            *value = decoded;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Decoding, Encoding};
    use crate::error::Error;
    use crate::gateway::ReleaseConfig;
    use crate::model::MessagesPage;
    use chrono::{TimeZone, Utc};
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    fn email(id: &str, to: &str, subject: &str, text: &str) -> Email {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Email {
            id: id.into(),
            from: "system@example.com".into(),
            to: to.into(),
            cc: String::new(),
            bcc: String::new(),
            reply_to: String::new(),
            subject: subject.into(),
            text: text.into(),
            html: String::new(),
            date,
            delivery_date: date,
            attachments: Vec::new(),
        }
    }

    /// Serves scripted batches: call `n` gets `script[n]`, later calls the last entry.
    #[derive(Default)]
    struct ScriptedGateway {
        script: Vec<Vec<Email>>,
        fail_on_call: Option<usize>,
        list_calls: AtomicUsize,
        searches: Mutex<Vec<String>>,
    }

    impl ScriptedGateway {
        fn new(script: Vec<Vec<Email>>) -> Self {
            Self {
                script,
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst) + self.searches.lock().unwrap().len()
        }

        fn next_batch(&self, call: usize) -> Result<MessagesPage> {
            if self.fail_on_call == Some(call) {
                return Err(Error::UnexpectedStatus {
                    operation: "list_messages",
                    target: "/api/v2/messages".into(),
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                });
            }
            let items = self
                .script
                .get(call)
                .or(self.script.last())
                .cloned()
                .unwrap_or_default();
            Ok(MessagesPage {
                total: items.len(),
                count: items.len(),
                start: 0,
                items,
            })
        }
    }

    impl Gateway for ScriptedGateway {
        async fn list_messages(&self, _start: usize, _limit: usize) -> Result<MessagesPage> {
            let call = self.calls();
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.next_batch(call)
        }

        async fn search_messages(
            &self,
            query: &str,
            kind: SearchKind,
            _start: usize,
            _limit: usize,
        ) -> Result<MessagesPage> {
            assert_eq!(kind, SearchKind::Containing);
            let call = self.calls();
            self.searches.lock().unwrap().push(query.to_string());
            let mut page = self.next_batch(call)?;
            page.items.retain(|email| email.text.contains(query));
            Ok(page)
        }

        async fn delete_message(&self, _id: &str) -> Result<()> {
            Ok(())
        }

        async fn delete_all(&self) -> Result<()> {
            Ok(())
        }

        async fn release_message(&self, _id: &str, _config: &ReleaseConfig) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_with_zero_retries() {
        let gateway = ScriptedGateway::new(vec![vec![email("1", "a@x", "Reset", "")]]);
        let criteria = FindCriteria::new().to("a@x").num_retries(0);

        let found = retrieve(&gateway, &criteria, 5000).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_without_match_waits_nothing() {
        let gateway = ScriptedGateway::new(vec![vec![email("1", "other@x", "Reset", "")]]);
        let criteria = FindCriteria::new()
            .to("a@x")
            .num_retries(0)
            .retry_delay_ms(1_000);

        let started = Instant::now();
        let found = retrieve(&gateway, &criteria, 5000).await.unwrap();

        assert!(found.is_empty());
        assert_eq!(gateway.calls(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_delivery_returns_early() {
        let late = email("late", "a@x", "Welcome", "");
        let gateway = ScriptedGateway::new(vec![vec![], vec![], vec![late]]);
        let criteria = FindCriteria::new()
            .to("a@x")
            .num_retries(5)
            .retry_delay_ms(100);

        let started = Instant::now();
        let found = retrieve(&gateway, &criteria, 5000).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(gateway.calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_returns_empty() {
        let gateway = ScriptedGateway::new(vec![vec![email("1", "other@x", "Reset", "")]]);
        let criteria = FindCriteria::new()
            .to("a@x")
            .num_retries(3)
            .retry_delay_ms(250);

        let started = Instant::now();
        let found = retrieve(&gateway, &criteria, 5000).await.unwrap();

        assert!(found.is_empty());
        assert_eq!(gateway.calls(), 4);
        assert_eq!(started.elapsed(), Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_baseline_policy_makes_two_attempts() {
        let gateway = ScriptedGateway::new(vec![vec![]]);

        let started = Instant::now();
        let found = retrieve(&gateway, &FindCriteria::new(), 5000).await.unwrap();

        assert!(found.is_empty());
        assert_eq!(gateway.calls(), 2);
        assert_eq!(started.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_retries_immediately() {
        let gateway = ScriptedGateway::new(vec![vec![]]);
        let criteria = FindCriteria::new().num_retries(4).retry_delay_ms(0);

        let started = Instant::now();
        retrieve(&gateway, &criteria, 5000).await.unwrap();

        assert_eq!(gateway.calls(), 5);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gateway_error_aborts_without_retrying() {
        let gateway = ScriptedGateway {
            script: vec![vec![]],
            fail_on_call: Some(1),
            ..ScriptedGateway::default()
        };
        let criteria = FindCriteria::new().num_retries(5).retry_delay_ms(100);

        let err = retrieve(&gateway, &criteria, 5000).await.unwrap_err();

        assert!(matches!(err, Error::UnexpectedStatus { .. }));
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_body_uses_search() {
        let batch = vec![
            email("1", "a@x", "s", "NO SEARSTR"),
            email("2", "a@x", "s", "YES SEARCH-STR"),
            email("3", "a@x", "s", "NO SEARCH-ST"),
            email("4", "a@x", "s", "YES SEAR SEARCH-STR YES"),
            email("5", "a@x", "s", "SEARCH-STR"),
        ];
        let gateway = ScriptedGateway::new(vec![batch]);
        let criteria = FindCriteria::new().body("SEARCH-STR").num_retries(0);

        let found = retrieve(&gateway, &criteria, 5000).await.unwrap();

        let ids: Vec<&str> = found.iter().map(|email| email.id.as_str()).collect();
        assert_eq!(ids, ["2", "4", "5"]);
        assert_eq!(gateway.list_calls.load(Ordering::SeqCst), 0);
        assert_eq!(*gateway.searches.lock().unwrap(), ["SEARCH-STR"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_is_preserved() {
        let gateway = ScriptedGateway::new(vec![vec![
            email("newest", "a@x", "s", ""),
            email("skip", "b@x", "s", ""),
            email("older", "a@x", "s", ""),
            email("oldest", "a@x", "s", ""),
        ]]);
        let criteria = FindCriteria::new().to("a@x").num_retries(0);

        let found = retrieve(&gateway, &criteria, 5000).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|email| email.id.as_str()).collect();
        assert_eq!(ids, ["newest", "older", "oldest"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offset_and_limit_window_the_matches() {
        let gateway = ScriptedGateway::new(vec![vec![
            email("1", "a@x", "s", ""),
            email("2", "a@x", "s", ""),
            email("3", "a@x", "s", ""),
            email("4", "a@x", "s", ""),
        ]]);
        let criteria = FindCriteria::new().offset(1).limit(2).num_retries(0);

        let found = retrieve(&gateway, &criteria, 5000).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|email| email.id.as_str()).collect();
        assert_eq!(ids, ["2", "3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_rewrites_returned_copies_only() {
        let original = email("1", "a@x", "UmVzZXQ=", "SGVsbG8=");
        let gateway = ScriptedGateway::new(vec![vec![original.clone()]]);
        let criteria = FindCriteria::new()
            .num_retries(0)
            .decode(Decoding::new(Encoding::Base64));

        let found = retrieve(&gateway, &criteria, 5000).await.unwrap();

        assert_eq!(found[0].subject, "Reset");
        assert_eq!(found[0].text, "Hello");
        assert_eq!(found[0].html, "");
        // The gateway's copy is untouched
        assert_eq!(gateway.script[0][0], original);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_keeps_plain_subject_and_decodes_body() {
        let gateway = ScriptedGateway::new(vec![vec![email(
            "m1",
            "a@x",
            "Reset your password",
            "SGVsbG8=",
        )]]);
        let criteria = FindCriteria::new()
            .to("a@x")
            .num_retries(0)
            .decode(Decoding::new(Encoding::Base64));

        let found = retrieve(&gateway, &criteria, 5000).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "m1");
        assert_eq!(found[0].subject, "Reset your password");
        assert_eq!(found[0].text, "Hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_never_fails_the_retrieval() {
        let gateway = ScriptedGateway::new(vec![vec![email("m7", "a@x", "UmVzZXQ=", "!!!")]]);
        let criteria = FindCriteria::new()
            .num_retries(0)
            .decode(Decoding::new(Encoding::Base64).charset("utf-8"));

        let found = retrieve(&gateway, &criteria, 5000).await.unwrap();
        assert_eq!(found[0].subject, "Reset");
        assert_eq!(found[0].text, "!!!");
    }
}
