//! Request/response model shared by the fetch client and the worker.
//!
//! The engine sits between a host page and the network, so it works with a
//! reduced view of HTTP: an intercepted request carries just the metadata
//! the classifier and strategies need, and a served response is an owned
//! status/header/body triple that can be stored, cloned, and returned
//! without stream bookkeeping.

use std::collections::BTreeMap;

use bytes::Bytes;
use url::Url;

/// Request mode as reported by the interception hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Top-level navigation to a document.
    Navigate,
    Cors,
    NoCors,
    SameOrigin,
}

/// Destination hint for the requested resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDestination {
    Document,
    Script,
    Style,
    Image,
    Font,
    /// Anything the host did not attribute more precisely.
    Unknown,
}

/// A request handed to the engine by the interception hook.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    /// Uppercase HTTP method.
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    pub destination: RequestDestination,
}

impl InterceptedRequest {
    /// Build a plain GET request with no mode or destination hints.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the URL is not absolute.
    pub fn get(url: &str) -> Result<Self, crate::Error> {
        let url = Url::parse(url).map_err(|e| crate::Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            method: "GET".to_string(),
            url,
            mode: RequestMode::Cors,
            destination: RequestDestination::Unknown,
        })
    }

    /// Build a top-level navigation request.
    pub fn navigation(url: &str) -> Result<Self, crate::Error> {
        let mut request = Self::get(url)?;
        request.mode = RequestMode::Navigate;
        request.destination = RequestDestination::Document;
        Ok(request)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

/// A fully constructed response, either fetched, replayed from the cache,
/// or synthesized as a fallback.
///
/// Header names are stored lowercase so lookups and stored JSON are
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl ServedResponse {
    /// Create an empty response with the given status.
    pub fn new(status: u16) -> Self {
        Self { status, headers: BTreeMap::new(), body: Bytes::new() }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Set a header in place, replacing any previous value.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_lowercase(), value.to_string());
    }

    /// Declared body size from the `content-length` header, when parseable.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length").and_then(|v| v.parse().ok())
    }

    /// 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Below 400: worth keeping a copy of.
    pub fn is_cacheable(&self) -> bool {
        self.status < 400
    }
}
