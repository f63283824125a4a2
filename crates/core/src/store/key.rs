//! Normalized request-key generation.
//!
//! Cache lookups are keyed by a digest of the request identity rather than
//! the raw URL, so key length is bounded and comparison is cheap.

use sha2::{Digest, Sha256};

use crate::http::InterceptedRequest;

/// Compute the cache key for a method + URL pair.
///
/// The URL should already be canonical; two spellings of the same resource
/// hash to different keys.
pub fn request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cache key for an intercepted request.
pub fn key_for(request: &InterceptedRequest) -> String {
    request_key(&request.method, request.url.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let key1 = request_key("GET", "https://example.com/app.js");
        let key2 = request_key("GET", "https://example.com/app.js");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_different_urls() {
        let key1 = request_key("GET", "https://example.com/a");
        let key2 = request_key("GET", "https://example.com/b");
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_key_method_sensitive() {
        let get = request_key("GET", "https://example.com/");
        let head = request_key("HEAD", "https://example.com/");
        assert_ne!(get, head);
    }

    #[test]
    fn test_key_format() {
        let key = request_key("GET", "https://example.com/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_for_request() {
        let request = InterceptedRequest::get("https://example.com/app.js").unwrap();
        assert_eq!(key_for(&request), request_key("GET", "https://example.com/app.js"));
    }
}
