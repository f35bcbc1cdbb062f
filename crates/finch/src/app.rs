// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process wiring shared by the subcommands.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use finch_agent::{ChatPipeline, drain_background};
use finch_config::FinchConfig;
use finch_core::{EmbeddingAdapter, FinchError, PluginAdapter, ProviderAdapter, StorageAdapter};
use finch_openai::{OpenAiProvider, resolve_api_key};
use finch_prometheus::sink::DEFAULT_CAPACITY;
use finch_prometheus::{MetricsSink, PrometheusAdapter};
use finch_security::{RedactingWriter, register_secret};
use finch_storage::{Database, SqliteStorage};
use secrecy::ExposeSecret;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Grace period for detached fact extraction at exit.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the metrics drain may run once the sinks are dropped.
const METRICS_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Initialize the tracing subscriber.
///
/// Log lines go to stderr through a [`RedactingWriter`], so any secret later
/// added to `secrets` is scrubbed from output.
pub fn init_tracing(log_level: &str, secrets: Arc<RwLock<Vec<String>>>) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("finch={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(move || RedactingWriter::new(std::io::stderr(), secrets.clone()))
        .init();
}

/// Open the configured SQLite database.
pub async fn open_storage(config: &FinchConfig) -> Result<(SqliteStorage, Database), FinchError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let db = storage.database()?;
    Ok((storage, db))
}

/// Build the OpenAI adapter and register its key for log scrubbing.
pub fn open_provider(
    config: &FinchConfig,
    secrets: &Arc<RwLock<Vec<String>>>,
) -> Result<Arc<OpenAiProvider>, FinchError> {
    let key = resolve_api_key(&config.openai.api_key)?;
    register_secret(secrets, key.expose_secret().to_string());
    Ok(Arc::new(OpenAiProvider::new(&config.openai)?))
}

/// Everything a chat turn needs, opened once per process.
pub struct App {
    pub pipeline: ChatPipeline,
    storage: SqliteStorage,
    provider: Arc<OpenAiProvider>,
    metrics: MetricsSink,
    metrics_task: JoinHandle<()>,
}

impl App {
    pub async fn open(
        config: &FinchConfig,
        secrets: &Arc<RwLock<Vec<String>>>,
    ) -> Result<Self, FinchError> {
        let (storage, db) = open_storage(config).await?;
        let provider = open_provider(config, secrets)?;

        let recorder = Arc::new(PrometheusAdapter::install()?);
        let (metrics, metrics_task) = MetricsSink::spawn(recorder, DEFAULT_CAPACITY);

        let completions: Arc<dyn ProviderAdapter> = provider.clone();
        let embeddings: Arc<dyn EmbeddingAdapter> = provider.clone();
        let pipeline =
            ChatPipeline::new(config, db, completions, embeddings).with_metrics(metrics.clone());

        info!(
            database = %config.storage.database_path,
            model = %config.openai.chat_model,
            "finch ready"
        );
        Ok(Self {
            pipeline,
            storage,
            provider,
            metrics,
            metrics_task,
        })
    }

    /// Drain background work, flush metrics and close the database.
    pub async fn shutdown(self) {
        if !drain_background(&self.pipeline, DRAIN_TIMEOUT).await {
            warn!("exiting with fact extraction still in flight");
        }

        let dropped = self.metrics.dropped();
        if dropped > 0 {
            debug!(dropped, "metric events dropped during run");
        }
        // The drain task ends once the last sink clone is gone. Tasks still
        // in flight hold clones, so the wait is bounded.
        drop(self.pipeline);
        drop(self.metrics);
        if !finish_metrics(self.metrics_task, METRICS_FLUSH_TIMEOUT).await {
            warn!("metrics drain abandoned at exit");
        }

        if let Err(e) = self.provider.shutdown().await {
            warn!(error = %e, "provider shutdown failed");
        }
        if let Err(e) = self.storage.close().await {
            warn!(error = %e, "storage close failed");
        }
    }
}

/// Wait up to `limit` for the metrics drain task, aborting it on expiry.
/// Returns false when the task had to be aborted.
async fn finish_metrics(mut task: JoinHandle<()>, limit: Duration) -> bool {
    match tokio::time::timeout(limit, &mut task).await {
        Ok(_) => true,
        Err(_) => {
            task.abort();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn metrics_drain_held_open_is_aborted() {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<u8>(1);
        let task = tokio::spawn(async move { while rx.recv().await.is_some() {} });

        // `tx` stays alive, as a sink clone in a hung extraction task would.
        assert!(!finish_metrics(task, Duration::from_secs(2)).await);
        drop(tx);
    }

    #[tokio::test]
    async fn finished_metrics_drain_completes() {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<u8>(1);
        let task = tokio::spawn(async move { while rx.recv().await.is_some() {} });
        drop(tx);
        assert!(finish_metrics(task, Duration::from_secs(2)).await);
    }
}
