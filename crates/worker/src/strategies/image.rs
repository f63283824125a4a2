//! Cache-first strategy for images, with a size guard.
//!
//! Images are cached opportunistically in the dynamic partition, stamped
//! so the sweeper ages them out. Bodies over the configured cap are served
//! but never stored; the cap is judged from the `content-length` header
//! and an absent header allows caching. A failed image load degrades to a
//! placeholder graphic with status 200 — a grey rectangle beats a broken
//! image glyph.

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

    if let Some(entry) = read_entry(store, &config.dynamic_cache_name, &request_key).await {
        tracing::debug!(url = %request.url, "image cache hit");
        return entry.into_response();
    }

    match fetcher.fetch(request, config.fetch_timeout()).await {
        Ok(response) if response.is_cacheable() => {
            let under_cap = response
                .content_length()
                .is_none_or(|len| len <= config.image_cache_max_bytes);
            if under_cap {
                let entry = CachedEntry::from_response(request.url.as_str(), &response, Some(Utc::now()));
                spawn_put(store, &config.dynamic_cache_name, &request_key, entry);
            } else {
                tracing::debug!(url = %request.url, "image over cache cap, serving uncached");
            }
            response
        }
        Ok(response) => {
            tracing::debug!(url = %request.url, status = response.status, "image fetch returned error status");
            fallback::placeholder_image()
        }
        Err(e) => {
            tracing::debug!(url = %request.url, error = %e, "image fetch failed");
            fallback::placeholder_image()
        }
    }
}
