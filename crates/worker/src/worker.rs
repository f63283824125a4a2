//! The worker: one instance per engine version.
//!
//! Owns the configuration, the store, the fetch primitive, and the
//! lifecycle state, and exposes the three host-facing surfaces: the
//! interception hook (`handle_request`), the command channel
//! (`handle_message`), and the deferred-task trigger (`handle_task`).

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use stratus_client::{Fetch, canonicalize};
use stratus_core::{
    AppConfig, CachedEntry, Error, InterceptedRequest, RequestDestination, RequestMode, ServedResponse, StoreDb,
    store::key,
};

use crate::classify::{self, ResourceClass};
use crate::commands::{CacheStatusReport, Command, parse};
use crate::lifecycle::{HostHooks, LifecycleState};
use crate::{strategies, sweeper};

pub struct Worker {
    config: AppConfig,
    store: StoreDb,
    fetcher: Arc<dyn Fetch>,
    hooks: Arc<dyn HostHooks>,
    state: RwLock<LifecycleState>,
}

impl Worker {
    pub fn new(config: AppConfig, store: StoreDb, fetcher: Arc<dyn Fetch>, hooks: Arc<dyn HostHooks>) -> Self {
        Self { config, store, fetcher, hooks, state: RwLock::new(LifecycleState::Installing) }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &StoreDb {
        &self.store
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Populate the static partition with the critical assets.
    ///
    /// Serving without them defeats the purpose, so any miss here is
    /// fatal to the install attempt and surfaced to the caller. On
    /// success the host is asked to replace the previous instance
    /// without waiting.
    ///
    /// # Errors
    ///
    /// `Error::InstallFailed` when a critical asset cannot be fetched or
    /// stored; store errors from opening the partition.
    pub async fn install(&self) -> Result<(), Error> {
        *self.state.write().await = LifecycleState::Installing;
        tracing::info!(version = %self.config.cache_name, "installing");

        self.store.open_partition(&self.config.static_cache_name).await?;

        for path in &self.config.critical_assets {
            let url = self
                .config
                .resolve_path(path)
                .map_err(|e| Error::InstallFailed(e.to_string()))?;
            let request = InterceptedRequest::get(url.as_str())?;

            let response = self
                .fetcher
                .fetch(&request, self.config.fetch_timeout())
                .await
                .map_err(|e| Error::InstallFailed(format!("{path}: {e}")))?;
            if !response.is_cacheable() {
                return Err(Error::InstallFailed(format!("{path}: status {}", response.status)));
            }

            let entry = CachedEntry::from_response(url.as_str(), &response, None);
            self.store
                .put_entry(&self.config.static_cache_name, &key::key_for(&request), &entry)
                .await
                .map_err(|e| Error::InstallFailed(format!("{path}: {e}")))?;
        }

        self.hooks.skip_waiting().await;
        *self.state.write().await = LifecycleState::Installed;
        tracing::info!(assets = self.config.critical_assets.len(), "critical assets cached");
        Ok(())
    }

    /// Garbage-collect partitions from prior versions, take control of
    /// open clients, and start the best-effort secondary preload.
    ///
    /// Cleanup completes before the state becomes `Active`; the preload
    /// runs in the background and cannot fail activation.
    ///
    /// # Errors
    ///
    /// Store errors from enumerating or deleting partitions.
    pub async fn activate(&self) -> Result<(), Error> {
        *self.state.write().await = LifecycleState::Activating;
        tracing::info!(version = %self.config.cache_name, "activating");

        let recognized = self.config.recognized_partitions();
        for name in self.store.list_partitions().await? {
            if !recognized.contains(&name.as_str()) {
                tracing::info!(partition = %name, "deleting stale partition");
                self.store.delete_partition(&name).await?;
            }
        }

        self.store.open_partition(&self.config.static_cache_name).await?;
        self.store.open_partition(&self.config.dynamic_cache_name).await?;

        self.hooks.claim_clients().await;
        *self.state.write().await = LifecycleState::Active;

        self.spawn_secondary_preload();
        Ok(())
    }

    /// The interception hook. Returns `None` when the engine declines
    /// the request and the host should let it through natively.
    pub async fn handle_request(&self, request: &InterceptedRequest) -> Option<ServedResponse> {
        if classify::should_bypass(&self.config, request) {
            tracing::trace!(url = %request.url, "bypassing request");
            return None;
        }

        let class = classify::classify(&self.config, request);
        let response = match class {
            ResourceClass::Document => {
                strategies::document::serve(&self.config, &self.store, &self.fetcher, request).await
            }
            ResourceClass::StaticAsset => {
                strategies::static_asset::serve(&self.config, &self.store, &self.fetcher, request).await
            }
            ResourceClass::Api => strategies::api::serve(&self.config, &self.store, &self.fetcher, request).await,
            ResourceClass::Image => strategies::image::serve(&self.config, &self.store, &self.fetcher, request).await,
            ResourceClass::Other => {
                strategies::passthrough::serve(&self.config, &self.store, &self.fetcher, request).await
            }
        };
        Some(response)
    }

    /// The command channel. Only `CACHE_STATUS` produces a reply;
    /// handler failures are logged and the command no-ops.
    pub async fn handle_message(&self, message: &serde_json::Value) -> Option<serde_json::Value> {
        match parse(message)? {
            Command::ClearCache => {
                self.clear_all_caches().await;
                None
            }
            Command::SkipWaiting => {
                self.hooks.skip_waiting().await;
                None
            }
            Command::CacheStatus => {
                let report = self.cache_status().await;
                match serde_json::to_value(&report) {
                    Ok(reply) => Some(reply),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to serialize cache status");
                        None
                    }
                }
            }
            Command::PrefetchImages { urls } => {
                self.prefetch_images(urls).await;
                None
            }
        }
    }

    /// The deferred-task trigger for out-of-band work.
    pub async fn handle_task(&self, name: &str) {
        match name {
            "cache-cleanup" => {
                sweeper::sweep(&self.store, &self.config.dynamic_cache_name, self.config.sweep_max_age()).await;
            }
            "background-sync" => {
                sweeper::sweep(&self.store, &self.config.dynamic_cache_name, self.config.sweep_max_age()).await;
                self.spawn_secondary_preload();
            }
            other => {
                tracing::debug!(task = other, "ignoring unknown task");
            }
        }
    }

    /// Start the periodic sweep of the dynamic partition.
    pub fn start_sweeper(&self) -> JoinHandle<()> {
        sweeper::spawn_periodic(
            self.store.clone(),
            self.config.dynamic_cache_name.clone(),
            self.config.sweep_max_age(),
            self.config.sweep_interval(),
        )
    }

    /// Report partition names and entry counts.
    pub async fn cache_status(&self) -> CacheStatusReport {
        let mut partitions = BTreeMap::new();
        match self.store.list_partitions().await {
            Ok(names) => {
                for name in names {
                    let count = self.store.partition_entry_count(&name).await.unwrap_or(0);
                    partitions.insert(name, count);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to enumerate partitions for status");
            }
        }
        CacheStatusReport { caches: partitions.len(), version: self.config.cache_name.clone(), partitions }
    }

    /// Drop every entry from every partition. Running against an empty
    /// store is a no-op, not an error.
    async fn clear_all_caches(&self) {
        let names = match self.store.list_partitions().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "clear-all could not enumerate partitions");
                return;
            }
        };
        for name in names {
            match self.store.clear_partition(&name).await {
                Ok(cleared) => tracing::info!(partition = %name, cleared, "cleared partition"),
                Err(e) => tracing::warn!(partition = %name, error = %e, "failed to clear partition"),
            }
        }
    }

    /// Warm the dynamic cache with the given image URLs, bounded by the
    /// configured cap. Individual failures are logged and skipped.
    async fn prefetch_images(&self, urls: Vec<String>) {
        if urls.len() > self.config.prefetch_limit {
            tracing::debug!(
                requested = urls.len(),
                limit = self.config.prefetch_limit,
                "prefetch list truncated"
            );
        }

        for raw in urls.into_iter().take(self.config.prefetch_limit) {
            let url = match canonicalize(&raw) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(url = %raw, error = %e, "skipping unparseable prefetch url");
                    continue;
                }
            };
            let request = InterceptedRequest {
                method: "GET".to_string(),
                url,
                mode: RequestMode::NoCors,
                destination: RequestDestination::Image,
            };

            match self.fetcher.fetch(&request, self.config.fetch_timeout()).await {
                Ok(response) if response.is_ok() => {
                    let entry = CachedEntry::from_response(request.url.as_str(), &response, Some(Utc::now()));
                    if let Err(e) = self
                        .store
                        .put_entry(&self.config.dynamic_cache_name, &key::key_for(&request), &entry)
                        .await
                    {
                        tracing::debug!(url = %request.url, error = %e, "prefetch write failed");
                    }
                }
                Ok(response) => {
                    tracing::debug!(url = %request.url, status = response.status, "prefetch skipped");
                }
                Err(e) => {
                    tracing::debug!(url = %request.url, error = %e, "prefetch fetch failed");
                }
            }
        }
    }

    /// Best-effort preload of secondary assets into the static partition.
    /// Never blocks and never fails the caller.
    fn spawn_secondary_preload(&self) {
        if self.config.secondary_assets.is_empty() {
            return;
        }
        let store = self.store.clone();
        let fetcher = self.fetcher.clone();
        let partition = self.config.static_cache_name.clone();
        let timeout = self.config.fetch_timeout();
        let urls = self.config.secondary_assets.clone();

        tokio::spawn(async move {
            for raw in urls {
                let Ok(request) = InterceptedRequest::get(&raw) else {
                    tracing::debug!(url = %raw, "skipping unparseable secondary asset");
                    continue;
                };
                match fetcher.fetch(&request, timeout).await {
                    Ok(response) if response.is_ok() => {
                        let entry = CachedEntry::from_response(request.url.as_str(), &response, None);
                        if let Err(e) = store.put_entry(&partition, &key::key_for(&request), &entry).await {
                            tracing::debug!(url = %request.url, error = %e, "secondary preload write failed");
                        }
                    }
                    Ok(_) | Err(_) => {}
                }
            }
            tracing::debug!("secondary asset preload finished");
        });
    }
}
