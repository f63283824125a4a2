//! Constructed fallback responses.
//!
//! Every strategy terminates in one of these when both network and cache
//! fail. A user-facing response is never left unconstructed: scripts and
//! stylesheets degrade to valid-but-empty bodies, images to a placeholder
//! graphic, API calls to a machine-readable offline error.

use stratus_core::{InterceptedRequest, ServedResponse};

const OFFLINE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Offline</title>
    <style>
        body { font-family: sans-serif; text-align: center; padding: 4rem 1rem; }
        button { padding: 0.6rem 1.5rem; font-size: 1rem; cursor: pointer; }
    </style>
</head>
<body>
    <h1>You are offline</h1>
    <p>This page is not available right now. Cached content will be used where possible.</p>
    <button onclick="location.reload()">Retry</button>
</body>
</html>
"#;

const PLACEHOLDER_IMAGE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="150" viewBox="0 0 200 150">
    <rect width="200" height="150" fill="#e2e2e2"/>
    <path d="M60 100l30-40 25 30 15-18 30 28z" fill="#b0b0b0"/>
    <circle cx="70" cy="50" r="12" fill="#b0b0b0"/>
</svg>
"##;

const FALLBACK_SCRIPT: &str = "/* asset unavailable offline */\n";

const FALLBACK_STYLESHEET: &str = "/* asset unavailable offline */\n";

/// Minimal offline document, served when a navigation has neither network
/// nor any cached document to fall back on. Served with status 200: the
/// page renders as content, not as a browser error.
pub fn offline_page() -> ServedResponse {
    ServedResponse::new(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(OFFLINE_PAGE)
}

/// Placeholder graphic served in place of an unfetchable image, with
/// status 200 so the host renders a picture rather than a broken-image
/// glyph.
pub fn placeholder_image() -> ServedResponse {
    ServedResponse::new(200)
        .with_header("content-type", "image/svg+xml")
        .with_body(PLACEHOLDER_IMAGE)
}

/// Class-specific fallback for a failed static-asset fetch: an empty but
/// syntactically valid body for scripts and stylesheets, a plain 503 for
/// everything else.
pub fn for_static_asset(request: &InterceptedRequest) -> ServedResponse {
    let path = request.url.path();
    if path.ends_with(".js") || path.ends_with(".mjs") {
        ServedResponse::new(200)
            .with_header("content-type", "application/javascript")
            .with_body(FALLBACK_SCRIPT)
    } else if path.ends_with(".css") {
        ServedResponse::new(200)
            .with_header("content-type", "text/css")
            .with_body(FALLBACK_STYLESHEET)
    } else {
        service_unavailable()
    }
}

/// Machine-readable offline error for API calls with no usable cache entry.
pub fn offline_api_error() -> ServedResponse {
    let body = serde_json::json!({
        "error": "network unavailable",
        "offline": true,
        "cached": false,
    });
    ServedResponse::new(503)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
}

/// Generic 503 for anything without a more specific degraded form.
pub fn service_unavailable() -> ServedResponse {
    ServedResponse::new(503)
        .with_header("content-type", "text/plain")
        .with_body("offline")
}
