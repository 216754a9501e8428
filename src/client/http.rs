//! Reqwest-based HTTP transport for the portal.
//!
//! One blocking client with a cookie store carries the session across the
//! home page, login and license calls. The [`PortalTransport`] trait is the
//! seam the session client talks through.

use crate::config::RequesterConfig;
use crate::protocol::endpoints::BROWSER_USER_AGENT;
use crate::RequesterError;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use std::time::Duration;
use thiserror::Error;

/// HTTP response with the parts the validator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response body as text.
    pub body: String,

    /// Names of the cookies set by this response. Values are not kept.
    pub cookies: Vec<String>,
}

impl PortalResponse {
    fn from_response(response: Response) -> Result<Self, TransportError> {
        let status = response.status().as_u16();
        let cookies = response.cookies().map(|c| c.name().to_string()).collect();
        let body = response
            .text()
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(Self {
            status,
            body,
            cookies,
        })
    }
}

/// Connection-level failures. All of them are retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request did not complete within the timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// DNS failure, refused connection, TLS failure.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// Any other transport failure.
    #[error("request failed: {0}")]
    Other(String),

    /// The session was already closed.
    #[error("session is closed")]
    Closed,
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        // Drop the URL: the license query carries the customer id.
        let e = e.without_url();
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// Cookie-bearing HTTP session the portal calls go through.
pub trait PortalTransport {
    /// GET `url` with the given query parameters.
    fn get(&mut self, url: &Url, query: &[(&str, String)]) -> Result<PortalResponse, TransportError>;

    /// POST `body` to `url` with the given content type.
    fn post(
        &mut self,
        url: &Url,
        content_type: &str,
        body: String,
    ) -> Result<PortalResponse, TransportError>;

    /// Release connections and cookies. Later calls fail with `Closed`.
    fn close(&mut self);
}

/// Blocking reqwest client with a cookie store.
pub struct ReqwestTransport {
    client: Option<Client>,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport using the config's request timeout.
    ///
    /// # Errors
    /// Returns `Configuration` if the HTTP client cannot be built.
    pub fn new(config: &RequesterConfig) -> Result<Self, RequesterError> {
        Self::with_timeout(config.request_timeout)
    }

    /// Create a transport with an explicit per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, RequesterError> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                RequesterError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client: Some(client),
            timeout,
        })
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether [`PortalTransport::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.client.is_none()
    }

    fn client(&self) -> Result<&Client, TransportError> {
        self.client.as_ref().ok_or(TransportError::Closed)
    }
}

impl PortalTransport for ReqwestTransport {
    fn get(&mut self, url: &Url, query: &[(&str, String)]) -> Result<PortalResponse, TransportError> {
        let mut request = self.client()?.get(url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send()?;
        PortalResponse::from_response(response)
    }

    fn post(
        &mut self,
        url: &Url,
        content_type: &str,
        body: String,
    ) -> Result<PortalResponse, TransportError> {
        let response = self
            .client()?
            .post(url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()?;
        PortalResponse::from_response(response)
    }

    fn close(&mut self) {
        self.client = None;
    }
}

/// A call recorded by [`ScriptedTransport`].
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// `GET` or `POST`.
    pub method: &'static str,
    /// Target URL.
    pub url: String,
    /// Query parameters (GET only).
    pub query: Vec<(String, String)>,
    /// Content type (POST only).
    pub content_type: Option<String>,
    /// Request body (POST only).
    pub body: Option<String>,
}

#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Default)]
struct Script {
    replies: std::collections::VecDeque<Result<PortalResponse, TransportError>>,
    calls: Vec<RecordedCall>,
    close_count: usize,
}

/// Transport that replays scripted replies and records every call.
///
/// Clones share the same script, so a test can keep a handle after moving
/// the transport into a session.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: std::sync::Arc<std::sync::Mutex<Script>>,
}

#[cfg(any(test, feature = "test-seams"))]
impl ScriptedTransport {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn reply(self, status: u16, body: &str) -> Self {
        self.push(Ok(PortalResponse {
            status,
            body: body.to_string(),
            cookies: Vec::new(),
        }))
    }

    /// Queue a response that sets the named cookies.
    pub fn reply_with_cookies(self, status: u16, body: &str, cookies: &[&str]) -> Self {
        self.push(Ok(PortalResponse {
            status,
            body: body.to_string(),
            cookies: cookies.iter().map(|c| c.to_string()).collect(),
        }))
    }

    /// Queue a transport failure.
    pub fn fail(self, error: TransportError) -> Self {
        self.push(Err(error))
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// How many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.lock().close_count
    }

    fn push(self, reply: Result<PortalResponse, TransportError>) -> Self {
        self.lock().replies.push_back(reply);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next(&self, call: RecordedCall) -> Result<PortalResponse, TransportError> {
        let mut script = self.lock();
        if script.close_count > 0 {
            return Err(TransportError::Closed);
        }
        script.calls.push(call);
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("script exhausted".to_string())))
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl PortalTransport for ScriptedTransport {
    fn get(&mut self, url: &Url, query: &[(&str, String)]) -> Result<PortalResponse, TransportError> {
        self.next(RecordedCall {
            method: "GET",
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            content_type: None,
            body: None,
        })
    }

    fn post(
        &mut self,
        url: &Url,
        content_type: &str,
        body: String,
    ) -> Result<PortalResponse, TransportError> {
        self.next(RecordedCall {
            method: "POST",
            url: url.to_string(),
            query: Vec::new(),
            content_type: Some(content_type.to_string()),
            body: Some(body),
        })
    }

    fn close(&mut self) {
        self.lock().close_count += 1;
    }
}
