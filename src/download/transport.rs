//! Abstract HTTP transport for the retry engine.
//!
//! The engine never talks to reqwest directly; it issues GETs through the
//! [`Transport`] trait and evaluates the returned [`RawResponse`]. This keeps
//! the retry/backoff state machine testable with scripted transports and
//! keeps reqwest confined to [`HttpTransport`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::FetchError;

/// A buffered view of one HTTP response.
///
/// Header names are lowercased once at construction so lookups by the
/// rate-limit variant table are case-insensitive without further work.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, keys lowercased.
    pub headers: HashMap<String, String>,
    /// Full response body.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Creates a response, lowercasing header names.
    #[must_use]
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            status,
            headers,
            body,
        }
    }

    /// Looks up a header by name, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstract GET capability consumed by the retry engine.
///
/// Implementations decide their own per-request timeouts; the engine only
/// governs inter-attempt waiting.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a single GET request and buffers the response.
    ///
    /// An `Err` means the request never produced an HTTP response (DNS,
    /// connection, timeout). Error statuses (4xx/5xx) are returned as
    /// `Ok(RawResponse)` for the engine to classify.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Timeout`] or [`FetchError::Transport`].
    async fn do_get(&self, url: &str) -> Result<RawResponse, FetchError>;
}

/// reqwest-backed [`Transport`] for real downloads.
///
/// Created once and reused across the whole batch to benefit from
/// connection pooling.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    /// Creates a transport with default timeouts (30s connect, 5min read).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a transport with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .user_agent(default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self), fields(url = %url))]
    async fn do_get(&self, url: &str) -> Result<RawResponse, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::transport(url, e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::transport(url, e.to_string())
            }
        })?;

        debug!(status, bytes = body.len(), "GET completed");
        Ok(RawResponse::new(status, headers, body.to_vec()))
    }
}

/// Default User-Agent identifying the tool (good citizenship; RFC 9308).
#[must_use]
fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("ratefetch/{version} (bulk-download-tool)")
}
