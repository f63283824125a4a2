//! Network-first strategy for API calls.
//!
//! Fresh data is worth waiting for, so the network gets a longer timeout
//! than documents do. Successful responses are copied into the dynamic
//! partition stamped with a write timestamp; on network failure the cache
//! answers instead — verbatim while inside the freshness window, marked
//! `x-cache-status: stale` beyond it. With no entry at all, the caller
//! gets a machine-readable offline error.

use std::sync::Arc;

use chrono::Utc;
use stratus_client::Fetch;
use stratus_core::{AppConfig, CachedEntry, InterceptedRequest, ServedResponse, StoreDb, store::key};

use super::{read_entry, spawn_put};
use crate::fallback;

pub async fn serve(
    config: &AppConfig, store: &StoreDb, fetcher: &Arc<dyn Fetch>, request: &InterceptedRequest,
) -> ServedResponse {
    let request_key = key::key_for(request);

    match fetcher.fetch(request, config.api_timeout()).await {
        Ok(response) => {
            if response.is_ok() {
                let entry = CachedEntry::from_response(request.url.as_str(), &response, Some(Utc::now()));
                spawn_put(store, &config.dynamic_cache_name, &request_key, entry);
            }
            response
        }
        Err(e) => {
            tracing::debug!(url = %request.url, error = %e, "api fetch failed, consulting dynamic cache");
            match read_entry(store, &config.dynamic_cache_name, &request_key).await {
                Some(entry) => replay(config, entry),
                None => fallback::offline_api_error(),
            }
        }
    }
}

/// Replay a cached API response, marking it stale when it has aged past
/// the freshness window or carries no timestamp to judge it by.
fn replay(config: &AppConfig, entry: CachedEntry) -> ServedResponse {
    let fresh = matches!(
        entry.age(Utc::now()),
        Some(age) if age.num_seconds() < config.freshness_window_secs as i64
    );
    let mut response = entry.into_response();
    if !fresh {
        response.set_header("x-cache-status", "stale");
    }
    response
}
