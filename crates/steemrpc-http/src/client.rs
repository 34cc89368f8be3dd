//! HTTP session backed by `reqwest`.
//!
//! Each `send` is one POST of the envelope; the full body is the reply.
//! Failures to establish the TCP/TLS connection are re-sent immediately up
//! to [`HttpSessionConfig::transport_retries`] times, since the request never
//! reached the node. Everything else surfaces as a [`TransportError`] for the
//! client's retry engine.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use steemrpc_core::error::TransportError;
use steemrpc_core::pool::EndpointKind;
use steemrpc_core::session::Session;

/// Longest error body echoed into a [`TransportError::Http`].
const MAX_BODY_IN_ERROR: usize = 256;

/// Configuration for [`HttpPool`].
#[derive(Debug, Clone)]
pub struct HttpSessionConfig {
    pub connect_timeout: Duration,
    /// Total time allowed for one request, including reading the body.
    pub timeout: Duration,
    pub tcp_keepalive: Option<Duration>,
    /// Immediate re-sends after a connection-establishment error.
    pub transport_retries: u32,
}

impl Default for HttpSessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(60),
            timeout: Duration::from_secs(60),
            tcp_keepalive: Some(Duration::from_secs(60)),
            transport_retries: 20,
        }
    }
}

/// Shared HTTP connection pool. Clones share the underlying client.
#[derive(Debug, Clone)]
pub struct HttpPool {
    http: reqwest::Client,
    config: HttpSessionConfig,
}

impl HttpPool {
    pub fn new(config: HttpSessionConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .tcp_keepalive(config.tcp_keepalive)
            .build()
            .map_err(|e| TransportError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// A session posting to `url` over this pool.
    pub fn session(&self, url: impl Into<String>) -> HttpSession {
        HttpSession {
            url: url.into(),
            http: self.http.clone(),
            timeout: self.config.timeout,
            transport_retries: self.config.transport_retries,
        }
    }
}

/// One endpoint reached through an [`HttpPool`].
#[derive(Debug)]
pub struct HttpSession {
    url: String,
    http: reqwest::Client,
    timeout: Duration,
    transport_retries: u32,
}

impl HttpSession {
    fn map_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                ms: self.timeout.as_millis() as u64,
            }
        } else {
            TransportError::Http(e.to_string())
        }
    }

    async fn read_reply(&self, resp: reqwest::Response) -> Result<String, TransportError> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_error(e))?;
        // Nodes report JSON-RPC errors with 4xx/5xx statuses; only a
        // non-JSON error page is a transport failure.
        if !status.is_success() && serde_json::from_str::<serde_json::Value>(&body).is_err() {
            let mut excerpt = body.trim().to_owned();
            if excerpt.len() > MAX_BODY_IN_ERROR {
                let mut cut = MAX_BODY_IN_ERROR;
                while !excerpt.is_char_boundary(cut) {
                    cut -= 1;
                }
                excerpt.truncate(cut);
            }
            return Err(TransportError::Http(format!("HTTP {status}: {excerpt}")));
        }
        Ok(body)
    }
}

/// Run `attempt` once, then again up to `retries` times while it fails
/// with an error `is_connect` accepts.
async fn resend_on_connect_error<T, E, F, Fut>(
    retries: u32,
    is_connect: impl Fn(&E) -> bool,
    mut attempt: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut resent = 0u32;
    loop {
        match attempt().await {
            Err(e) if is_connect(&e) && resent < retries => {
                resent += 1;
                debug!(resent, error = %e, "connect failed, re-sending");
            }
            outcome => return outcome,
        }
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn send(&mut self, envelope: &str) -> Result<String, TransportError> {
        let resp = resend_on_connect_error(
            self.transport_retries,
            reqwest::Error::is_connect,
            || self.http.post(&self.url).body(envelope.to_owned()).send(),
        )
        .await
        .map_err(|e| self.map_error(e))?;
        self.read_reply(resp).await
    }

    async fn close(&mut self) {}

    fn kind(&self) -> EndpointKind {
        EndpointKind::RequestResponse
    }

    fn url(&self) -> &str {
        &self.url
    }
}
