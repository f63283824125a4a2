//! HTTP fetch primitive with per-request timeouts.
//!
//! Strategies never talk to reqwest directly; they go through the [`Fetch`]
//! trait so tests can substitute a scripted fake. The real implementation:
//!
//! - applies a per-request timeout that aborts the in-flight transfer
//!   (no automatic retry — retrying is the caller's concern)
//! - returns non-2xx responses as responses, not errors; only transport
//!   failures (DNS, connection, timeout) surface as `Err`
//! - lowercases header names so responses can be stored and replayed
//!   deterministically

pub mod url;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

pub use url::{UrlError, canonicalize};

use stratus_core::{Error, InterceptedRequest, ServedResponse};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "stratus/0.1")
    pub user_agent: String,

    /// Fallback timeout when the caller does not pass one (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "stratus/0.1".to_string(),
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// The network-fetch seam between the worker and the outside world.
///
/// `timeout` bounds the whole transfer, headers and body included; on
/// expiry the transfer is abandoned and `Error::FetchTimeout` returned.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: &InterceptedRequest, timeout: Duration) -> Result<ServedResponse, Error>;
}

/// HTTP fetch client backed by reqwest.
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, request: &InterceptedRequest, timeout: Duration) -> Result<ServedResponse, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(request.url.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))?;

        let status = response.status().as_u16();

        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))?;

        tracing::debug!(
            url = %request.url,
            status,
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fetched"
        );

        Ok(ServedResponse { status, headers, body })
    }
}

fn classify_reqwest_error(e: reqwest::Error, timeout: Duration) -> Error {
    if e.is_timeout() {
        Error::FetchTimeout(format!("aborted after {}ms", timeout.as_millis()))
    } else {
        Error::HttpError(format!("network error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "stratus/0.1");
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetcher_new() {
        let fetcher = HttpFetcher::new(FetchConfig::default());
        assert!(fetcher.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Nothing listens on this port; the transport error must surface as
        // an Error, not a panic or a synthesized response.
        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let request = InterceptedRequest::get("http://127.0.0.1:1/unreachable").unwrap();

        let result = fetcher.fetch(&request, Duration::from_millis(500)).await;
        assert!(matches!(result, Err(Error::HttpError(_)) | Err(Error::FetchTimeout(_))));
    }
}
