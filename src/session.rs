//! Internal MailHog HTTP API session.
//!
//! This module wraps reqwest calls to the MailHog API with proper error handling.

use crate::config::MailhogConfig;
use crate::error::{Error, Result};
use crate::gateway::{Gateway, ReleaseConfig, SearchKind};
use crate::model::MessagesPage;
use crate::parser;
use crate::telemetry;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Method, RequestBuilder, Response, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, instrument};

const MESSAGES_PATH: &str = "api/v2/messages";
const SEARCH_PATH: &str = "api/v2/search";
const DELETE_ALL_PATH: &str = "api/v1/messages";

/// [`Gateway`] over the MailHog HTTP API.
///
/// Built from a [`MailhogConfig`]; creating one performs no network I/O.
///
/// ```
/// use mailhog_sync::{HttpGateway, MailhogConfig};
///
/// # fn example() -> mailhog_sync::Result<()> {
/// let config = MailhogConfig::builder().host("mailhog").build()?;
/// let gateway = HttpGateway::new(&config)?;
/// assert_eq!(gateway.base_url().as_str(), "http://mailhog:8025/");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: Url,
    username: Option<String>,
    password: Option<SecretString>,
}

impl HttpGateway {
    /// Creates a gateway for the MailHog instance described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy is invalid or the HTTP client cannot be built.
    pub fn new(config: &MailhogConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.timeouts.connect)
            .timeout(config.timeouts.request);

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(proxy.to_reqwest()?);
        }

        let http = builder
            .build()
            .map_err(|source| Error::HttpClient { source })?;

        Ok(Self {
            http,
            base_url: config.base_url().clone(),
            username: config.username().map(str::to_string),
            password: config.password().map(|password| SecretString::from(password.to_string())),
        })
    }

    /// Returns the base URL API paths are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| Error::InvalidUrl {
            url: format!("{}{path}", self.base_url),
            message: e.to_string(),
        })
    }

    fn message_endpoint(&self, id: &str, suffix: &str) -> Result<Url> {
        let mut url = self.endpoint(DELETE_ALL_PATH)?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl {
                url: self.base_url.to_string(),
                message: "base URL cannot carry a path".into(),
            })?
            .push(id)
            .extend(suffix.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.username {
            Some(username) => builder.basic_auth(
                username,
                self.password.as_ref().map(|password| password.expose_secret()),
            ),
            None => builder,
        }
    }

    /// Sends a request and turns transport failures and non-success statuses into errors.
    async fn send(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
        target: &str,
    ) -> Result<Response> {
        let response = match builder.send().await {
            Ok(response) => response,
            Err(source) => {
                let error = Error::Request {
                    operation,
                    target: target.to_string(),
                    source,
                };
                telemetry::record_error(&error);
                return Err(error);
            }
        };

        let status = response.status();
        debug!(operation, target, status = status.as_u16(), "MailHog responded");

        if !status.is_success() {
            let error = Error::UnexpectedStatus {
                operation,
                target: target.to_string(),
                status,
            };
            telemetry::record_error(&error);
            return Err(error);
        }

        Ok(response)
    }

    async fn fetch_page(
        &self,
        url: Url,
        query: &[(&str, String)],
        operation: &'static str,
    ) -> Result<MessagesPage> {
        let target = url.path().to_string();
        let response = self
            .send(self.request(Method::GET, url).query(query), operation, &target)
            .await?;

        let bytes = response.bytes().await.map_err(|source| Error::Request {
            operation,
            target,
            source,
        })?;

        parser::parse_page(&bytes, operation)
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /api/v1/messages/{id}/release`.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReleaseRequest<'a> {
    host: &'a str,
    port: String,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mechanism: Option<&'static str>,
}

impl<'a> From<&'a ReleaseConfig> for ReleaseRequest<'a> {
    fn from(config: &'a ReleaseConfig) -> Self {
        Self {
            host: &config.host,
            port: config.port.to_string(),
            email: config.email(),
            username: config.username(),
            password: config.password(),
            mechanism: config.mechanism.map(|mechanism| mechanism.as_str()),
        }
    }
}

impl Gateway for HttpGateway {
    #[instrument(name = "session::list_messages", skip(self))]
    async fn list_messages(&self, start: usize, limit: usize) -> Result<MessagesPage> {
        let url = self.endpoint(MESSAGES_PATH)?;
        let query = [("start", start.to_string()), ("limit", limit.to_string())];
        self.fetch_page(url, &query, "list_messages").await
    }

    #[instrument(name = "session::search_messages", skip(self, kind), fields(kind = %kind))]
    async fn search_messages(
        &self,
        query: &str,
        kind: SearchKind,
        start: usize,
        limit: usize,
    ) -> Result<MessagesPage> {
        let url = self.endpoint(SEARCH_PATH)?;
        let params = [
            ("kind", kind.as_str().to_string()),
            ("query", query.to_string()),
            ("start", start.to_string()),
            ("limit", limit.to_string()),
        ];
        self.fetch_page(url, &params, "search_messages").await
    }

    #[instrument(name = "session::delete_message", skip(self))]
    async fn delete_message(&self, id: &str) -> Result<()> {
        let url = self.message_endpoint(id, "")?;
        self.send(self.request(Method::DELETE, url), "delete_message", id)
            .await?;
        Ok(())
    }

    #[instrument(name = "session::delete_all", skip(self))]
    async fn delete_all(&self) -> Result<()> {
        let url = self.endpoint(DELETE_ALL_PATH)?;
        self.send(self.request(Method::DELETE, url), "delete_all", DELETE_ALL_PATH)
            .await?;
        Ok(())
    }

    #[instrument(
        name = "session::release_message",
        skip(self, config),
        fields(smtp_host = %config.host, smtp_port = config.port)
    )]
    async fn release_message(&self, id: &str, config: &ReleaseConfig) -> Result<()> {
        let url = self.message_endpoint(id, "release")?;
        let body = ReleaseRequest::from(config);
        self.send(
            self.request(Method::POST, url).json(&body),
            "release_message",
            id,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::AuthMechanism;
    use httpmock::prelude::*;
    use serde_json::json;

    fn gateway_for(server: &MockServer) -> HttpGateway {
        let config = MailhogConfig::builder()
            .base_url(server.base_url())
            .build()
            .unwrap();
        HttpGateway::new(&config).unwrap()
    }

    fn message(id: &str, to: &str) -> serde_json::Value {
        json!({
            "ID": id,
            "Created": "2024-05-01T12:00:00Z",
            "Raw": { "Data": format!("To: {to}\r\nSubject: Hi\r\n\r\nbody") }
        })
    }

    #[tokio::test]
    async fn test_list_messages_sends_window() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v2/messages")
                    .query_param("start", "0")
                    .query_param("limit", "5000");
                then.status(200).json_body(json!({
                    "total": 2, "count": 2, "start": 0,
                    "items": [message("b", "b@x"), message("a", "a@x")]
                }));
            })
            .await;

        let page = gateway_for(&server).list_messages(0, 5000).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].id, "b");
        assert_eq!(page.items[1].to, "a@x");
    }

    #[tokio::test]
    async fn test_search_messages_sends_kind_and_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v2/search")
                    .query_param("kind", "containing")
                    .query_param("query", "SEARCH-STR")
                    .query_param("start", "0")
                    .query_param("limit", "10");
                then.status(200).json_body(json!({
                    "total": 1, "count": 1, "start": 0, "items": [message("a", "a@x")]
                }));
            })
            .await;

        let page = gateway_for(&server)
            .search_messages("SEARCH-STR", SearchKind::Containing, 0, 10)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v2/messages");
                then.status(503);
            })
            .await;

        let err = gateway_for(&server).list_messages(0, 10).await.unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedStatus {
                operation: "list_messages",
                ..
            }
        ));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_delete_message_and_delete_all() {
        let server = MockServer::start_async().await;
        let one = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/v1/messages/abc@mailhog.example");
                then.status(200);
            })
            .await;
        let all = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/v1/messages");
                then.status(200);
            })
            .await;

        let gateway = gateway_for(&server);
        gateway.delete_message("abc@mailhog.example").await.unwrap();
        gateway.delete_all().await.unwrap();

        one.assert_async().await;
        all.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_missing_message_reports_id() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/v1/messages/gone");
                then.status(404);
            })
            .await;

        let err = gateway_for(&server).delete_message("gone").await.unwrap_err();
        assert_eq!(err.target(), Some("gone"));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_release_message_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1/messages/m1/release")
                    .json_body(json!({
                        "Host": "smtp.local",
                        "Port": "1025",
                        "Email": "inbox@example.com",
                        "Username": "relay",
                        "Password": "secret",
                        "Mechanism": "CRAM-MD5"
                    }));
                then.status(200);
            })
            .await;

        let release = ReleaseConfig::new("smtp.local", 1025, "inbox@example.com")
            .unwrap()
            .credentials("relay", "secret")
            .mechanism(AuthMechanism::CramMd5);

        gateway_for(&server)
            .release_message("m1", &release)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_basic_auth_and_base_path() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/mailhog/api/v2/messages")
                    .header("Authorization", "Basic YWRtaW46c2VjcmV0");
                then.status(200)
                    .json_body(json!({ "total": 0, "count": 0, "start": 0, "items": [] }));
            })
            .await;

        let config = MailhogConfig::builder()
            .base_url(format!("{}/mailhog", server.base_url()))
            .basic_auth("admin", "secret")
            .build()
            .unwrap();
        let page = HttpGateway::new(&config)
            .unwrap()
            .list_messages(0, 1)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_request_error() {
        let config = MailhogConfig::builder()
            .base_url("http://127.0.0.1:9")
            .connect_timeout(std::time::Duration::from_millis(200))
            .build()
            .unwrap();

        let err = HttpGateway::new(&config)
            .unwrap()
            .list_messages(0, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Request { .. }));
        assert!(err.is_retryable());
    }
}
