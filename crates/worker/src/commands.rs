//! Typed command channel.
//!
//! The controlled page posts `{"type": ..., ...}` messages; this module is
//! the dispatch table's front half. Parsing is deliberately forgiving:
//! anything unrecognized becomes `None` and the worker ignores it rather
//! than erroring, so page and worker versions can drift during deploys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A recognized command from the controlled page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Drop every entry from every partition.
    #[serde(rename = "CLEAR_CACHE")]
    ClearCache,

    /// Force this version to take over now.
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,

    /// Report partition names and entry counts on the reply channel.
    #[serde(rename = "CACHE_STATUS")]
    CacheStatus,

    /// Warm the dynamic cache with a bounded list of image URLs.
    #[serde(rename = "PREFETCH_IMAGES")]
    PrefetchImages {
        #[serde(default)]
        urls: Vec<String>,
    },
}

/// Parse a raw message. Unrecognized or malformed messages yield `None`.
pub fn parse(message: &serde_json::Value) -> Option<Command> {
    match Command::deserialize(message) {
        Ok(command) => Some(command),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unrecognized message");
            None
        }
    }
}

/// Reply payload for `CACHE_STATUS`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatusReport {
    /// Number of partitions present.
    pub caches: usize,
    /// Aggregate cache identity of the running version.
    pub version: String,
    /// Entry count per partition, flattened into the reply object.
    #[serde(flatten)]
    pub partitions: BTreeMap<String, u64>,
}
