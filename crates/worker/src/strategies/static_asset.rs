//! Cache-first strategy for static assets.
//!
//! Versioned assets don't change under a given partition name, so a cached
//! copy always wins. On a miss the network response is returned directly
//! and a copy is stored in the background. When the network also fails, a
//! script or stylesheet degrades to an empty-but-valid body so the page
//! keeps parsing.

use std::sync::Arc;

use stratus_client::Fetch;
use stratus_core::{AppConfig, CachedEntry, InterceptedRequest, ServedResponse, StoreDb, store::key};

use super::{read_entry, spawn_put};
use crate::fallback;

pub async fn serve(
    config: &AppConfig, store: &StoreDb, fetcher: &Arc<dyn Fetch>, request: &InterceptedRequest,
) -> ServedResponse {
    let request_key = key::key_for(request);

    if let Some(entry) = read_entry(store, &config.static_cache_name, &request_key).await {
        tracing::debug!(url = %request.url, "static cache hit");
        return entry.into_response();
    }

    match fetcher.fetch(request, config.fetch_timeout()).await {
        Ok(response) => {
            if response.is_cacheable() {
                let entry = CachedEntry::from_response(request.url.as_str(), &response, None);
                spawn_put(store, &config.static_cache_name, &request_key, entry);
            }
            response
        }
        Err(e) => {
            tracing::debug!(url = %request.url, error = %e, "static asset fetch failed");
            fallback::for_static_asset(request)
        }
    }
}
