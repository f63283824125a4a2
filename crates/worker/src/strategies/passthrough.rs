//! Plain network fetch for unclassified resources.
//!
//! No caching either way; the engine only guarantees the caller a
//! constructed response.

use std::sync::Arc;

use stratus_client::Fetch;
use stratus_core::{AppConfig, InterceptedRequest, ServedResponse, StoreDb};

use crate::fallback;

pub async fn serve(
    config: &AppConfig, _store: &StoreDb, fetcher: &Arc<dyn Fetch>, request: &InterceptedRequest,
) -> ServedResponse {
    match fetcher.fetch(request, config.fetch_timeout()).await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(url = %request.url, error = %e, "passthrough fetch failed");
            fallback::service_unavailable()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{harness, test_config};

    #[tokio::test]
    async fn test_network_response_returned_unchanged() {
        let h = harness(test_config()).await;
        let request = InterceptedRequest::get("https://fonts.example.com/font.woff2").unwrap();
        let upstream = ServedResponse::new(200).with_body("glyphs");
        h.fetch.respond("https://fonts.example.com/font.woff2", upstream.clone());

        let config = test_config();
        let fetcher: Arc<dyn Fetch> = h.fetch.clone();
        let response = serve(&config, &h.store, &fetcher, &request).await;
        assert_eq!(response, upstream);
    }

    #[tokio::test]
    async fn test_nothing_cached() {
        let h = harness(test_config()).await;
        let request = InterceptedRequest::get("https://fonts.example.com/font.woff2").unwrap();
        h.fetch.respond("https://fonts.example.com/font.woff2", ServedResponse::new(200));

        let config = test_config();
        let fetcher: Arc<dyn Fetch> = h.fetch.clone();
        serve(&config, &h.store, &fetcher, &request).await;

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(h.store.partition_entry_count("app-static-v2").await.unwrap(), 0);
        assert_eq!(h.store.partition_entry_count("app-dynamic-v2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failure_yields_503() {
        let h = harness(test_config()).await;
        let request = InterceptedRequest::get("https://fonts.example.com/font.woff2").unwrap();
        h.fetch.fail("https://fonts.example.com/font.woff2");

        let config = test_config();
        let fetcher: Arc<dyn Fetch> = h.fetch.clone();
        let response = serve(&config, &h.store, &fetcher, &request).await;
        assert_eq!(response.status, 503);
    }
}
