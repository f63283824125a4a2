//! Retrieval strategies, one per resource class.
//!
//! Every strategy has the shape `serve(...) -> ServedResponse` and never
//! fails: cache errors are demoted to misses, network errors route into a
//! fallback chain, and the final link of every chain is a constructed
//! response. Cache writes on the request path are fire-and-forget — a
//! response is never held back waiting for its own copy to land.

pub mod api;
pub mod document;
pub mod image;
pub mod passthrough;
pub mod static_asset;

use stratus_core::{CachedEntry, StoreDb};

/// Store an entry in the background. The request path continues without
/// waiting; failures are logged and swallowed.
pub(crate) fn spawn_put(store: &StoreDb, partition: &str, key: &str, entry: CachedEntry) {
    let store = store.clone();
    let partition = partition.to_string();
    let key = key.to_string();
    tokio::spawn(async move {
        if let Err(e) = store.put_entry(&partition, &key, &entry).await {
            tracing::debug!(partition = %partition, error = %e, "background cache write failed");
        }
    });
}

/// Read an entry, demoting store errors to misses. Cache trouble must not
/// fail the request path.
pub(crate) async fn read_entry(store: &StoreDb, partition: &str, key: &str) -> Option<CachedEntry> {
    match store.get_entry(partition, key).await {
        Ok(entry) => entry,
        Err(e) => {
            tracing::debug!(partition = %partition, error = %e, "cache read failed, treating as miss");
            None
        }
    }
}
