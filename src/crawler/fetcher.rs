//! HTTP transport
//!
//! This module handles all HTTP requests issued by virtual users, including:
//! - Building one HTTP client per virtual user (own cookie jar, shared headers)
//! - Timing each request from send until the body has been read
//! - Capturing status, headers and body into a fixed-shape `ResponseRecord`
//! - Issuing batches of requests concurrently

use crate::config::RequestConfig;
use crate::LoadstormError;
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use std::time::{Duration, Instant};

/// Result of a single HTTP fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    /// URL that was requested
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// Response headers, names as received
    pub headers: Vec<(String, String)>,

    /// Time from sending the request until the body was read
    pub duration: Duration,

    /// Raw body text
    pub body: String,
}

impl ResponseRecord {
    /// Returns the first header value whose name matches case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The "response is OK" check: status must be exactly 200
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// One entry of a batched request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<String>,
}

impl BatchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: None,
        }
    }
}

/// Builds a batch of identical requests, one per URL
pub fn batch_from_urls(urls: &[String], method: Method, body: Option<&str>) -> Vec<BatchRequest> {
    urls.iter()
        .map(|url| BatchRequest {
            method: method.clone(),
            url: url.clone(),
            body: body.map(str::to_string),
        })
        .collect()
}

/// Issues HTTP requests on behalf of one virtual user
///
/// Shared request parameters (headers, cookie jar) belong to the transport, so
/// callers only pass what differs per request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches a single URL with GET
    async fn get(&self, url: &str) -> Result<ResponseRecord, LoadstormError>;

    /// Issues every request concurrently and waits for all of them
    ///
    /// The output is index-aligned with `requests`; one request failing never
    /// affects the others.
    async fn batch_get(
        &self,
        requests: Vec<BatchRequest>,
    ) -> Vec<Result<ResponseRecord, LoadstormError>>;
}

/// `Transport` backed by a `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds a transport with its own cookie store from the request config
    pub fn new(config: &RequestConfig) -> Result<Self, LoadstormError> {
        let client = build_http_client(config).map_err(LoadstormError::Client)?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        method: Method,
        url: String,
        body: Option<String>,
    ) -> Result<ResponseRecord, LoadstormError> {
        let mut request = self.client.request(method, url.as_str());
        if let Some(body) = body {
            request = request.body(body);
        }

        let started = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => return Err(LoadstormError::Http { url, source }),
        };

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = match response.text().await {
            Ok(body) => body,
            Err(source) => return Err(LoadstormError::Http { url, source }),
        };
        let duration = started.elapsed();

        Ok(ResponseRecord {
            url,
            status,
            headers,
            duration,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<ResponseRecord, LoadstormError> {
        self.send(Method::GET, url.to_string(), None).await
    }

    async fn batch_get(
        &self,
        requests: Vec<BatchRequest>,
    ) -> Vec<Result<ResponseRecord, LoadstormError>> {
        join_all(
            requests
                .into_iter()
                .map(|req| self.send(req.method, req.url, req.body)),
        )
        .await
    }
}

/// Builds an HTTP client with the shared request parameters
///
/// # Arguments
///
/// * `config` - Request settings (user agent, timeout, extra headers)
///
/// # Returns
///
/// * `Ok(Client)` - Client with a fresh cookie store
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use loadstorm::config::RequestConfig;
/// use loadstorm::crawler::build_http_client;
///
/// let client = build_http_client(&RequestConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &RequestConfig) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    for (name, value) in &config.headers {
        // Validated at config load; anything unparsable is skipped here
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                default_headers.insert(name, value);
            }
            _ => tracing::warn!("Skipping invalid header '{}'", name),
        }
    }

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(default_headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

fn collect_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
