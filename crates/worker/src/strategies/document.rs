//! Stale-while-revalidate strategy for documents and navigations.
//!
//! A cached document is returned immediately and refreshed in the
//! background; the refresh outcome cannot affect the response already on
//! its way out. Misses fetch with a short timeout — a navigation that
//! hangs is worse than a slightly stale page — and on failure fall back to
//! the cached root document, then to the built-in offline page.

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
        tracing::debug!(url = %request.url, "document cache hit, revalidating in background");
        spawn_revalidate(config, store, fetcher, request.clone(), request_key);
        return entry.into_response();
    }

    match fetcher.fetch(request, config.document_timeout()).await {
        Ok(response) => {
            if response.is_cacheable() {
                let entry = CachedEntry::from_response(request.url.as_str(), &response, None);
                spawn_put(store, &config.static_cache_name, &request_key, entry);
            }
            response
        }
        Err(e) => {
            tracing::debug!(url = %request.url, error = %e, "document fetch failed, falling back");
            offline_fallback(config, store).await
        }
    }
}

/// Refresh the cached copy without holding up the caller.
fn spawn_revalidate(
    config: &AppConfig, store: &StoreDb, fetcher: &Arc<dyn Fetch>, request: InterceptedRequest, request_key: String,
) {
    let store = store.clone();
    let fetcher = fetcher.clone();
    let partition = config.static_cache_name.clone();
    let timeout = config.document_timeout();
    tokio::spawn(async move {
        match fetcher.fetch(&request, timeout).await {
            Ok(response) if response.is_cacheable() => {
                let entry = CachedEntry::from_response(request.url.as_str(), &response, None);
                if let Err(e) = store.put_entry(&partition, &request_key, &entry).await {
                    tracing::debug!(url = %request.url, error = %e, "revalidation write failed");
                }
            }
            Ok(response) => {
                tracing::debug!(url = %request.url, status = response.status, "revalidation skipped");
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "revalidation fetch failed");
            }
        }
    });
}

/// The last links of the chain: cached fallback document, else the
/// built-in offline page.
async fn offline_fallback(config: &AppConfig, store: &StoreDb) -> ServedResponse {
    if let Ok(url) = config.resolve_path(&config.offline_fallback_path) {
        let fallback_key = key::request_key("GET", url.as_str());
        if let Some(entry) = read_entry(store, &config.static_cache_name, &fallback_key).await {
            return entry.into_response();
        }
    }
    fallback::offline_page()
}
