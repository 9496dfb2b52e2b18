use std::sync::{Arc, RwLock};
use std::time::Duration;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use tracing::{debug, warn};

use crate::ZidooError;

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// A fully built GET request: absolute URL, query pairs, headers and the
/// per-call timeout picked by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingRequest {
    pub url: String,
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(&'static str, String)>,
    pub timeout: Duration,
}

impl OutgoingRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What came back over the wire, before any JSON parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub set_cookies: Vec<String>,
    pub body: Bytes,
}

impl RawResponse {
    /// An HTTP 200 carrying `body` as JSON.
    pub fn json(body: &serde_json::Value) -> Self {
        Self {
            status: 200,
            set_cookies: Vec::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    pub fn with_cookie(mut self, cookie: &str) -> Self {
        self.set_cookies.push(cookie.to_string());
        self
    }
}

/// The network seam used by the request executor.
pub trait Transport: Send + Sync {
    fn send(&self, request: OutgoingRequest) -> BoxFuture<'static, Result<RawResponse, ZidooError>>;

    /// Drops pooled connections. Called on disconnect.
    fn reset(&self) {}
}

/// reqwest-backed transport with a keep-alive connection pool.
pub struct HttpTransport {
    client: RwLock<Arc<Client>>,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ZidooError> {
        Ok(Self {
            client: RwLock::new(Arc::new(Self::build_client()?)),
        })
    }

    fn build_client() -> Result<Client, ZidooError> {
        Ok(Client::builder()
            .pool_idle_timeout(Some(POOL_IDLE_TIMEOUT))
            .pool_max_idle_per_host(4)
            .build()?)
    }

    fn current(&self) -> Option<Arc<Client>> {
        self.client.read().ok().map(|guard| guard.clone())
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: OutgoingRequest) -> BoxFuture<'static, Result<RawResponse, ZidooError>> {
        let client = self.current();
        async move {
            let client = client.ok_or(ZidooError::NotConnected)?;
            let mut builder = client
                .get(&request.url)
                .query(&request.query)
                .timeout(request.timeout);
            for (name, value) in &request.headers {
                builder = builder.header(*name, value);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    ZidooError::Timeout(request.timeout)
                } else {
                    ZidooError::Transport(e)
                }
            })?;

            let status = response.status().as_u16();
            let set_cookies = response
                .headers()
                .get_all(reqwest::header::SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .map(str::to_string)
                .collect();
            let body = response.bytes().await.map_err(|e| {
                if e.is_timeout() {
                    ZidooError::Timeout(request.timeout)
                } else {
                    ZidooError::Transport(e)
                }
            })?;

            Ok(RawResponse {
                status,
                set_cookies,
                body,
            })
        }
        .boxed()
    }

    fn reset(&self) {
        match Self::build_client() {
            Ok(fresh) => {
                if let Ok(mut guard) = self.client.write() {
                    *guard = Arc::new(fresh);
                    debug!("HTTP connection pool released.");
                }
            }
            Err(e) => warn!(error = %e, "Could not rebuild HTTP client, keeping the old pool"),
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}
