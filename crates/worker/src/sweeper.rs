//! Age-based eviction of dynamic cache entries.
//!
//! The sweep enumerates a partition and deletes entries whose `cached_at`
//! annotation is older than the configured age. Unannotated entries are
//! never touched. Each entry is handled independently: one failed read or
//! delete does not abort the rest, and overlapping sweeps are harmless
//! because deleting an absent entry is a no-op.

use std::time::Duration;

use chrono::Utc;
use stratus_core::StoreDb;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Delete annotated entries older than `max_age`.
///
/// Returns the number of deleted entries. Store failures are logged and
/// swallowed; a sweep never surfaces an error.
pub async fn sweep(store: &StoreDb, partition: &str, max_age: Duration) -> u64 {
    let keys = match store.entry_keys(partition).await {
        Ok(keys) => keys,
        Err(e) => {
            tracing::warn!(partition, error = %e, "sweep could not enumerate partition");
            return 0;
        }
    };

    let now = Utc::now();
    let mut deleted = 0u64;

    for key in keys {
        let entry = match store.get_entry(partition, &key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!(partition, error = %e, "sweep skipped unreadable entry");
                continue;
            }
        };

        let Some(age) = entry.age(now) else { continue };
        if age.num_seconds() <= max_age.as_secs() as i64 {
            continue;
        }

        match store.delete_entry(partition, &key).await {
            Ok(true) => deleted += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::debug!(partition, error = %e, "sweep failed to delete entry");
            }
        }
    }

    if deleted > 0 {
        tracing::info!(partition, deleted, "sweep evicted aged entries");
    }
    deleted
}

/// Run the sweep on a repeating interval.
///
/// The first sweep happens one full period after spawn. The interval is a
/// parameter so tests can drive the loop in milliseconds.
pub fn spawn_periodic(store: StoreDb, partition: String, max_age: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() fires immediately; skip that so a fresh worker does
        // not sweep before it has served anything.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sweep(&store, &partition, max_age).await;
        }
    })
}
