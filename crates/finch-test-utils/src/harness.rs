// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline tests.
//!
//! `TestHarness` assembles a [`ChatPipeline`] over a temp SQLite database,
//! a [`MockProvider`], a [`MockEmbedder`], a [`ManualClock`] and a
//! [`MockObserver`], and exposes the pieces for assertions.

use std::sync::Arc;
use std::time::Duration;

use finch_agent::{ChatPipeline, ChatRequest, ChatResponse};
use finch_config::FinchConfig;
use finch_core::FinchError;
use finch_prometheus::MetricsSink;
use finch_prometheus::sink::DEFAULT_CAPACITY;
use finch_ratelimit::ManualClock;
use finch_storage::queries::{facts, messages};
use finch_storage::{Database, StoredMessage};

use crate::mock_embedder::MockEmbedder;
use crate::mock_observer::MockObserver;
use crate::mock_provider::MockProvider;

/// 2026-03-01T12:00:00Z, aligned to a minute boundary.
pub const DEFAULT_START_MILLIS: i64 = 1_772_366_400_000;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    config: FinchConfig,
    start_millis: i64,
    provider_delay: Option<Duration>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = FinchConfig::default();
        config.agent.system_prompt = "You are a test assistant.".to_string();
        // Retries stay on, but without waiting.
        config.resilience.base_delay_ms = 0;
        config.resilience.max_jitter_ms = 0;
        Self {
            responses: Vec::new(),
            config,
            start_millis: DEFAULT_START_MILLIS,
            provider_delay: None,
        }
    }

    /// Replies the mock provider returns, in order.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Adjust the configuration before the pipeline is built.
    pub fn with_config(mut self, f: impl FnOnce(&mut FinchConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Initial reading of the manual clock.
    pub fn with_start_millis(mut self, millis: i64) -> Self {
        self.start_millis = millis;
        self
    }

    /// Make every completion call take `delay`.
    pub fn with_provider_delay(mut self, delay: Duration) -> Self {
        self.provider_delay = Some(delay);
        self
    }

    pub async fn build(self) -> Result<TestHarness, FinchError> {
        let temp_dir = tempfile::TempDir::new().map_err(FinchError::storage)?;
        let db_path = temp_dir.path().join("finch-test.db");
        let db = Database::open_with(&db_path.to_string_lossy(), true).await?;

        let mut provider = MockProvider::with_responses(self.responses);
        if let Some(delay) = self.provider_delay {
            provider = provider.with_delay(delay);
        }
        let provider = Arc::new(provider);
        let embedder = Arc::new(MockEmbedder::new());
        let clock = Arc::new(ManualClock::new(self.start_millis));
        let observer = Arc::new(MockObserver::new());
        let (metrics, _drain) = MetricsSink::spawn(observer.clone(), DEFAULT_CAPACITY);

        let pipeline = ChatPipeline::new(&self.config, db.clone(), provider.clone(), embedder.clone())
            .with_clock(clock.clone())
            .with_metrics(metrics.clone());

        Ok(TestHarness {
            pipeline: Arc::new(pipeline),
            db,
            provider,
            embedder,
            clock,
            observer,
            metrics,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete pipeline over mocks and a temp database.
pub struct TestHarness {
    pub pipeline: Arc<ChatPipeline>,
    /// Temp database shared with the pipeline, removed on drop.
    pub db: Database,
    pub provider: Arc<MockProvider>,
    pub embedder: Arc<MockEmbedder>,
    pub clock: Arc<ManualClock>,
    pub observer: Arc<MockObserver>,
    pub config: FinchConfig,
    metrics: MetricsSink,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run one turn through the pipeline.
    pub async fn send(&self, request: ChatRequest) -> Result<ChatResponse, FinchError> {
        self.pipeline.handle(request).await
    }

    /// Run one turn for `user_id` in conversation `conversation_id`.
    pub async fn say(
        &self,
        user_id: &str,
        conversation_id: &str,
        message: &str,
    ) -> Result<ChatResponse, FinchError> {
        self.send(ChatRequest::new(user_id, conversation_id, message))
            .await
    }

    /// Every stored message of a conversation, oldest first.
    pub async fn messages(&self, user_id: &str, conversation_id: &str) -> Vec<StoredMessage> {
        messages::recent_messages(&self.db, user_id, conversation_id, 10_000)
            .await
            .unwrap_or_default()
    }

    pub async fn summary(&self, user_id: &str, conversation_id: &str) -> String {
        self.pipeline
            .summarizer()
            .get_summary(user_id, conversation_id)
            .await
            .unwrap_or_default()
    }

    pub async fn fact_count(&self, user_id: &str) -> u64 {
        facts::count_facts(&self.db, user_id).await.unwrap_or(0)
    }

    /// Wait for background extraction and for queued metric events to land.
    pub async fn settle(&self) {
        self.pipeline.wait_for_background().await;
        while self.metrics.pending() > 0 {
            tokio::task::yield_now().await;
        }
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert!(harness.messages("u1", "c1").await.is_empty());
        assert_eq!(harness.summary("u1", "c1").await, "");
        assert_eq!(harness.fact_count("u1").await, 0);
    }

    #[tokio::test]
    async fn say_returns_scripted_reply_and_persists_turn() {
        let harness = TestHarness::builder()
            .with_mock_responses(vec!["scripted reply".to_string()])
            .with_config(|c| c.summary.enabled = false)
            .build()
            .await
            .unwrap();

        let resp = harness.say("u1", "c1", "hello").await.unwrap();
        assert_eq!(resp.reply, "scripted reply");

        let stored = harness.messages("u1", "c1").await;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].role, "user");
        assert_eq!(stored[0].content, "hello");
        assert_eq!(stored[1].role, "assistant");
        assert_eq!(stored[1].content, "scripted reply");
    }

    #[tokio::test]
    async fn temp_db_is_unique_per_harness() {
        let h1 = TestHarness::builder().build().await.unwrap();
        let h2 = TestHarness::builder().build().await.unwrap();

        h1.say("u1", "c1", "msg1").await.unwrap();
        assert!(!h1.messages("u1", "c1").await.is_empty());
        assert!(h2.messages("u1", "c1").await.is_empty());
    }
}
