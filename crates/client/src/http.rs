//! reqwest-backed [`Transport`].

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode};
use search::{BaseUrl, HttpMethod, QueryParams, SearchError, TransientHttpError, Transport, TransportError};
use serde_json::Value;
use tracing::debug;

/// Per-request timeout, covering connect, send, and body download.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const USER_AGENT: &str = concat!("niceboard-client/", env!("CARGO_PKG_VERSION"));

/// Longest error body echoed into a [`TransportError`] message.
const MAX_ERROR_BODY: usize = 200;

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: BaseUrl,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: USER_AGENT.to_owned(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Sends requests to `{base_url}/{path}` and decodes JSON responses.
///
/// Outcomes map onto [`TransportError`] as follows:
///
/// | Outcome | Error |
/// |---------|-------|
/// | timeout | `Transient(Timeout)` |
/// | connect / I/O failure | `Transient(Network)` |
/// | unbuildable request, redirect limit | `Request` (not retried) |
/// | 429 | `Transient(RateLimited)` with `Retry-After` seconds |
/// | 5xx | `Transient(Server)` |
/// | other 4xx | `Permanent` |
/// | 2xx with a non-JSON or undecodable body | `Decode` |
///
/// A non-success status keeps its classification even when its body cannot
/// be read.
///
/// Request URLs carry the API key, so they are stripped from reqwest errors
/// and never logged.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: BaseUrl,
}

impl HttpTransport {
    /// Builds the underlying connection pool.
    ///
    /// # Errors
    ///
    /// [`SearchError::Configuration`] if the TLS backend or the user agent
    /// cannot be initialised.
    pub fn new(config: ClientConfig) -> Result<Self, SearchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| SearchError::configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        query: &QueryParams,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let started = Instant::now();
        let mut request = self
            .http
            .request(to_reqwest(method), self.base_url.join(path))
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(classify_send_error)?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            // The status already says what happened; a lost error body does
            // not change its classification.
            Err(err) if !status.is_success() => return Err(unreadable_body(status, err.without_url(), retry_after)),
            Err(err) => return Err(classify_send_error(err)),
        };

        debug!(
            %method,
            path,
            status = status.as_u16(),
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream response"
        );

        if !status.is_success() {
            return Err(TransportError::from_status(
                status.as_u16(),
                upstream_message(status, &bytes),
                retry_after,
            ));
        }

        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode {
            message: format!("response body is not JSON: {e}"),
        })
    }
}

fn to_reqwest(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// How a reqwest failure that produced no usable response is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    /// The client timeout elapsed.
    Timeout,
    /// Connect, send, or body transfer failed.
    Network,
    /// The request could not be built or redirects were exhausted.
    Request,
    /// The body could not be decoded.
    Decode,
}

impl FailureKind {
    fn of(err: &reqwest::Error) -> Self {
        if err.is_builder() || err.is_redirect() {
            FailureKind::Request
        } else if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_decode() {
            FailureKind::Decode
        } else {
            // is_connect, is_request, is_body, and transport-level failures
            // reqwest does not label further.
            FailureKind::Network
        }
    }

    fn into_error(self, message: String) -> TransportError {
        match self {
            FailureKind::Timeout => TransientHttpError::Timeout { message }.into(),
            FailureKind::Network => TransientHttpError::Network { message }.into(),
            FailureKind::Request => TransportError::Request { message },
            FailureKind::Decode => TransportError::Decode { message },
        }
    }
}

fn classify_send_error(err: reqwest::Error) -> TransportError {
    let err = err.without_url();
    FailureKind::of(&err).into_error(err.to_string())
}

/// An error status whose body could not be read, classified by the status.
fn unreadable_body(status: StatusCode, cause: impl fmt::Display, retry_after: Option<Duration>) -> TransportError {
    TransportError::from_status(
        status.as_u16(),
        format!("{} (body unreadable: {cause})", reason(status)),
        retry_after,
    )
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("unknown error")
}

/// Delay-seconds form only; HTTP-date values are ignored.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Best human-readable message from an error response.
///
/// Prefers `error` or `message` from a JSON body (including the nested
/// `{"error": {"message": ..}}` form), then the raw body truncated, then the
/// status reason phrase.
fn upstream_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(json) = serde_json::from_slice::<Value>(body) {
        let field = json
            .get("error")
            .and_then(|e| e.get("message").or(Some(e)))
            .filter(|v| v.is_string())
            .or_else(|| json.get("message"))
            .and_then(Value::as_str);
        if let Some(message) = field {
            return message.to_owned();
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return reason(status).to_owned();
    }
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_owned(),
    }
}
