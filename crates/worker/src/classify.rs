//! Resource classification and bypass rules.
//!
//! Classification is a pure, total function over request metadata: it never
//! fails and it has no side effects. The rules form an ordered list; the
//! first match wins, so adding a class later cannot silently reorder the
//! existing decisions.

use stratus_core::{AppConfig, InterceptedRequest, RequestDestination, RequestMode};

/// The class a request falls into, deciding which strategy serves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    Document,
    StaticAsset,
    Api,
    Image,
    Other,
}

const SCRIPT_STYLE_EXTENSIONS: &[&str] = &[".js", ".mjs", ".css"];

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".ico", ".avif"];

/// Path substrings that mark analytics/tracking endpoints the engine must
/// never touch.
const TRACKING_MARKERS: &[&str] = &["analytics", "tracking"];

const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1", "[::1]"];

/// Map a request to its resource class.
///
/// Rules, in priority order:
/// 1. navigation mode, document destination, or an URL ending in `/` or
///    `.html` — document
/// 2. script/style extension, configured CDN host, or the manifest —
///    static asset
/// 3. configured backend API host — api
/// 4. image destination or image extension — image
/// 5. anything else — other
pub fn classify(config: &AppConfig, request: &InterceptedRequest) -> ResourceClass {
    if is_document(request) {
        ResourceClass::Document
    } else if is_static_asset(config, request) {
        ResourceClass::StaticAsset
    } else if is_api(config, request) {
        ResourceClass::Api
    } else if is_image(request) {
        ResourceClass::Image
    } else {
        ResourceClass::Other
    }
}

/// Whether the engine should decline the request entirely and let it pass
/// through natively: non-GET methods, non-http(s) schemes (extension
/// pages), loopback, and excluded analytics/tracking traffic.
pub fn should_bypass(config: &AppConfig, request: &InterceptedRequest) -> bool {
    if !request.is_get() {
        return true;
    }

    let scheme = request.url.scheme();
    if scheme != "http" && scheme != "https" {
        return true;
    }

    let host = request.url.host_str().unwrap_or("");
    if LOOPBACK_HOSTS.contains(&host) {
        return true;
    }
    if config.excluded_hosts.iter().any(|excluded| host_matches(host, excluded)) {
        return true;
    }

    let path = request.url.path();
    TRACKING_MARKERS.iter().any(|marker| path.contains(marker))
}

fn is_document(request: &InterceptedRequest) -> bool {
    request.mode == RequestMode::Navigate
        || request.destination == RequestDestination::Document
        || request.url.path().ends_with('/')
        || request.url.path().ends_with(".html")
}

fn is_static_asset(config: &AppConfig, request: &InterceptedRequest) -> bool {
    let path = request.url.path();
    if SCRIPT_STYLE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return true;
    }
    if path.ends_with("manifest.json") {
        return true;
    }
    let host = request.url.host_str().unwrap_or("");
    config.cdn_hosts.iter().any(|cdn| host_matches(host, cdn))
}

fn is_api(config: &AppConfig, request: &InterceptedRequest) -> bool {
    let host = request.url.host_str().unwrap_or("");
    config.api_hosts.iter().any(|api| host_matches(host, api))
}

fn is_image(request: &InterceptedRequest) -> bool {
    if request.destination == RequestDestination::Image {
        return true;
    }
    let path = request.url.path().to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Exact host match or subdomain of the configured name.
fn host_matches(host: &str, configured: &str) -> bool {
    host == configured || host.ends_with(&format!(".{configured}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_core::InterceptedRequest;

    fn config() -> AppConfig {
        AppConfig {
            api_hosts: vec!["api.example.com".into()],
            cdn_hosts: vec!["cdn.jsdelivr.net".into()],
            excluded_hosts: vec!["google-analytics.com".into()],
            ..Default::default()
        }
    }

    fn get(url: &str) -> InterceptedRequest {
        InterceptedRequest::get(url).unwrap()
    }

    #[test]
    fn test_document_rules() {
        let config = config();
        assert_eq!(classify(&config, &get("https://app.example.com/")), ResourceClass::Document);
        assert_eq!(
            classify(&config, &get("https://app.example.com/about.html")),
            ResourceClass::Document
        );
        assert_eq!(
            classify(&config, &InterceptedRequest::navigation("https://app.example.com/deals").unwrap()),
            ResourceClass::Document
        );
    }

    #[test]
    fn test_static_asset_rules() {
        let config = config();
        assert_eq!(
            classify(&config, &get("https://app.example.com/main.js")),
            ResourceClass::StaticAsset
        );
        assert_eq!(
            classify(&config, &get("https://app.example.com/style.css")),
            ResourceClass::StaticAsset
        );
        assert_eq!(
            classify(&config, &get("https://app.example.com/manifest.json")),
            ResourceClass::StaticAsset
        );
        assert_eq!(
            classify(&config, &get("https://cdn.jsdelivr.net/npm/some-lib@2")),
            ResourceClass::StaticAsset
        );
    }

    #[test]
    fn test_api_rules() {
        let config = config();
        assert_eq!(classify(&config, &get("https://api.example.com/items")), ResourceClass::Api);
        // Subdomains of the configured host count.
        assert_eq!(classify(&config, &get("https://eu.api.example.com/items")), ResourceClass::Api);
        // Unconfigured hosts do not.
        assert_eq!(classify(&config, &get("https://api.other.com/items")), ResourceClass::Other);
    }

    #[test]
    fn test_image_rules() {
        let config = config();
        assert_eq!(classify(&config, &get("https://app.example.com/logo.png")), ResourceClass::Image);
        assert_eq!(classify(&config, &get("https://app.example.com/photo.JPG")), ResourceClass::Image);

        let mut request = get("https://app.example.com/media/17");
        request.destination = stratus_core::RequestDestination::Image;
        assert_eq!(classify(&config, &request), ResourceClass::Image);
    }

    #[test]
    fn test_priority_order() {
        let config = config();
        // A script served from the API host is still a static asset:
        // rule 2 fires before rule 3.
        assert_eq!(
            classify(&config, &get("https://api.example.com/widget.js")),
            ResourceClass::StaticAsset
        );
        // An .html path wins over everything.
        assert_eq!(
            classify(&config, &get("https://api.example.com/docs.html")),
            ResourceClass::Document
        );
        // An SVG on a CDN host is a static asset, not an image.
        assert_eq!(
            classify(&config, &get("https://cdn.jsdelivr.net/icons/x.svg")),
            ResourceClass::StaticAsset
        );
    }

    #[test]
    fn test_classification_is_stable() {
        let config = config();
        let request = get("https://app.example.com/logo.png");
        let first = classify(&config, &request);
        for _ in 0..10 {
            assert_eq!(classify(&config, &request), first);
        }
    }

    #[test]
    fn test_bypass_non_get() {
        let config = config();
        let mut request = get("https://app.example.com/items");
        request.method = "POST".into();
        assert!(should_bypass(&config, &request));
    }

    #[test]
    fn test_bypass_excluded_host() {
        let config = config();
        assert!(should_bypass(&config, &get("https://www.google-analytics.com/collect")));
        assert!(should_bypass(&config, &get("https://google-analytics.com/collect")));
    }

    #[test]
    fn test_bypass_tracking_paths() {
        let config = config();
        assert!(should_bypass(&config, &get("https://app.example.com/analytics/beacon")));
        assert!(should_bypass(&config, &get("https://app.example.com/tracking.gif")));
    }

    #[test]
    fn test_bypass_loopback() {
        let config = config();
        assert!(should_bypass(&config, &get("http://localhost:3000/dev")));
        assert!(should_bypass(&config, &get("http://127.0.0.1:8000/")));
    }

    #[test]
    fn test_no_bypass_for_app_traffic() {
        let config = config();
        assert!(!should_bypass(&config, &get("https://app.example.com/")));
        assert!(!should_bypass(&config, &get("https://api.example.com/items")));
    }
}
