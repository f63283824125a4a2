//! Shared test doubles: a scripted fetcher, recording host hooks, and a
//! worker wired to an in-memory store.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use stratus_client::Fetch;
use stratus_core::{AppConfig, CachedEntry, Error, InterceptedRequest, ServedResponse, StoreDb};

use crate::lifecycle::HostHooks;
use crate::worker::Worker;

/// What the fake fetcher does when a URL is requested.
pub(crate) enum Outcome {
    Respond(ServedResponse),
    Fail,
    Timeout,
}

/// Scripted [`Fetch`] implementation recording every call.
#[derive(Default)]
pub(crate) struct FakeFetch {
    outcomes: Mutex<HashMap<String, Outcome>>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, response: ServedResponse) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(url.to_string(), Outcome::Respond(response));
    }

    pub fn fail(&self, url: &str) {
        self.outcomes.lock().unwrap().insert(url.to_string(), Outcome::Fail);
    }

    pub fn time_out(&self, url: &str) {
        self.outcomes.lock().unwrap().insert(url.to_string(), Outcome::Timeout);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Fetch for FakeFetch {
    async fn fetch(&self, request: &InterceptedRequest, _timeout: Duration) -> Result<ServedResponse, Error> {
        let url = request.url.as_str().to_string();
        self.calls.lock().unwrap().push(url.clone());
        match self.outcomes.lock().unwrap().get(&url) {
            Some(Outcome::Respond(response)) => Ok(response.clone()),
            Some(Outcome::Fail) => Err(Error::HttpError("connection refused".into())),
            Some(Outcome::Timeout) => Err(Error::FetchTimeout("aborted".into())),
            None => Err(Error::HttpError(format!("no scripted response for {url}"))),
        }
    }
}

/// Host hooks that count their invocations.
#[derive(Default)]
pub(crate) struct RecordingHooks {
    pub skip_waiting: AtomicUsize,
    pub claim_clients: AtomicUsize,
}

impl RecordingHooks {
    pub fn skip_waiting_count(&self) -> usize {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn claim_clients_count(&self) -> usize {
        self.claim_clients.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostHooks for RecordingHooks {
    async fn skip_waiting(&self) {
        self.skip_waiting.fetch_add(1, Ordering::SeqCst);
    }

    async fn claim_clients(&self) {
        self.claim_clients.fetch_add(1, Ordering::SeqCst);
    }
}

/// Configuration pointing at fake hosts, with names distinct enough to
/// catch partition mixups.
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        origin: "https://app.example.com".into(),
        cache_name: "app-v2".into(),
        static_cache_name: "app-static-v2".into(),
        dynamic_cache_name: "app-dynamic-v2".into(),
        critical_assets: vec!["/".into(), "/index.html".into()],
        api_hosts: vec!["api.example.com".into()],
        ..Default::default()
    }
}

pub(crate) struct TestHarness {
    pub worker: Arc<Worker>,
    pub store: StoreDb,
    pub fetch: Arc<FakeFetch>,
    pub hooks: Arc<RecordingHooks>,
}

/// Build a worker over an in-memory store, a scripted fetcher, and
/// recording hooks.
pub(crate) async fn harness(config: AppConfig) -> TestHarness {
    let store = StoreDb::open_in_memory().await.unwrap();
    let fetch = Arc::new(FakeFetch::new());
    let hooks = Arc::new(RecordingHooks::default());
    let worker = Arc::new(Worker::new(config, store.clone(), fetch.clone(), hooks.clone()));
    TestHarness { worker, store, fetch, hooks }
}

/// Poll until a background (fire-and-forget) write lands.
///
/// Panics after ~2s: strategy writes are spawned, not awaited, so tests
/// must not assume synchronous visibility.
pub(crate) async fn wait_for_entry(store: &StoreDb, partition: &str, key: &str) -> CachedEntry {
    for _ in 0..200 {
        if let Ok(Some(entry)) = store.get_entry(partition, key).await {
            return entry;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("entry never appeared in {partition}");
}
