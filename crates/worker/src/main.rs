//! stratus worker entry point.
//!
//! Boots the engine — install, activate, periodic sweeper — and serves the
//! command channel over stdin/stdout JSON lines. Logging goes to stderr so
//! replies on stdout stay parseable.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

use stratus_client::{FetchConfig, HttpFetcher};
use stratus_core::{AppConfig, StoreDb};
use stratus_worker::{NoopHooks, Worker};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.cache_name, db = %config.db_path.display(), "starting stratus worker");

    let store = StoreDb::open(&config.db_path).await?;
    let fetcher = HttpFetcher::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        timeout: config.fetch_timeout(),
        ..Default::default()
    })?;

    let worker = Arc::new(Worker::new(config, store, Arc::new(fetcher), Arc::new(NoopHooks)));

    worker.install().await?;
    worker.activate().await?;
    let _sweeper = worker.start_sweeper();

    tracing::info!("worker active, serving command channel on stdio");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed message");
                continue;
            }
        };

        // Deferred-task triggers share the channel: {"task": "cache-cleanup"}.
        if let Some(task) = message.get("task").and_then(|v| v.as_str()) {
            worker.handle_task(task).await;
            continue;
        }

        if let Some(reply) = worker.handle_message(&message).await {
            println!("{reply}");
        }
    }

    Ok(())
}
