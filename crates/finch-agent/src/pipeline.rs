// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One chat turn, end to end.
//!
//! Rate limit -> recall + summary -> prompt assembly -> completion (timeout +
//! retry) -> persist both messages -> fact extraction -> summary rollup.
//! Only the first four steps can fail the turn; everything after the reply
//! exists degrades with a warning.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use finch_config::FinchConfig;
use finch_context::{BuiltContext, ContextBuilder, Summarizer, cap_tokens};
use finch_core::{
    ChatMessage, CompletionRequest, EmbeddingAdapter, FinchError, MetricEvent, ProviderAdapter,
    Role,
};
use finch_memory::{MemoryStore, extract_facts};
use finch_prometheus::MetricsSink;
use finch_prometheus::recording::{
    CHAT_TURNS_TOTAL, COMPLETION_LATENCY_SECONDS, CONTEXT_OVER_LIMIT_TOTAL, FACTS_TOTAL,
    RATE_LIMITED_TOTAL,
};
use finch_ratelimit::{Clock, RateLimiter};
use finch_resilience::{RetryPolicy, retry_with_backoff, with_timeout};
use finch_security::{MaskStrategy, mask_pii};
use finch_storage::{Database, StoredMessage};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::request::{ChatRequest, ChatResponse};

/// Token ceiling applied to the summary and each recalled fact before budgeting.
const MAX_ENTRY_TOKENS: u32 = 1200;

/// Settings copied out of [`FinchConfig`] at construction.
#[derive(Debug, Clone)]
struct TurnSettings {
    system_prompt: String,
    default_persona: String,
    chat_model: String,
    temperature: f32,
    max_tokens: u32,
    completion_timeout: Duration,
    history_limit: usize,
    memory_enabled: bool,
    background_extraction: bool,
    mask_pii: bool,
    summary_enabled: bool,
    recent_turns: usize,
}

impl TurnSettings {
    fn from_config(config: &FinchConfig) -> Self {
        Self {
            system_prompt: config.agent.system_prompt.clone(),
            default_persona: config.agent.persona.clone(),
            chat_model: config.openai.chat_model.clone(),
            temperature: config.openai.temperature,
            max_tokens: config.openai.max_tokens,
            completion_timeout: Duration::from_secs(config.resilience.timeout_secs),
            history_limit: config.context.history_limit as usize,
            memory_enabled: config.memory.enabled,
            background_extraction: config.memory.background_extraction,
            mask_pii: config.memory.mask_pii,
            summary_enabled: config.summary.enabled,
            recent_turns: config.summary.recent_turns,
        }
    }
}

/// The per-turn chat pipeline.
///
/// Every collaborator is passed in at construction; the pipeline holds no
/// global state and can be shared behind an `Arc`.
pub struct ChatPipeline {
    settings: TurnSettings,
    limiter: Option<RateLimiter>,
    memory: Arc<MemoryStore>,
    summarizer: Summarizer,
    builder: ContextBuilder,
    provider: Arc<dyn ProviderAdapter>,
    retry: RetryPolicy,
    metrics: MetricsSink,
    background: TaskTracker,
}

impl ChatPipeline {
    pub fn new(
        config: &FinchConfig,
        db: Database,
        provider: Arc<dyn ProviderAdapter>,
        embedder: Arc<dyn EmbeddingAdapter>,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config.resilience);
        let limiter = config
            .rate_limit
            .enabled
            .then(|| RateLimiter::new(db.clone(), &config.rate_limit));
        let memory = Arc::new(MemoryStore::new(
            db.clone(),
            embedder,
            &config.memory,
            retry,
        ));
        let summarizer = Summarizer::new(
            db,
            provider.clone(),
            config.openai.chat_model.clone(),
            &config.summary,
            retry,
        );

        Self {
            settings: TurnSettings::from_config(config),
            limiter,
            memory,
            summarizer,
            builder: ContextBuilder::from_config(&config.context),
            provider,
            retry,
            metrics: MetricsSink::disabled(),
            background: TaskTracker::new(),
        }
    }

    /// Send metric events to `sink`.
    pub fn with_metrics(mut self, sink: MetricsSink) -> Self {
        self.metrics = sink;
        self
    }

    /// Use `clock` for rate-limit windows.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.limiter = self.limiter.map(|l| l.with_clock(clock));
        self
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    pub fn limiter(&self) -> Option<&RateLimiter> {
        self.limiter.as_ref()
    }

    /// Wait for detached fact-extraction tasks started so far.
    pub async fn wait_for_background(&self) {
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }

    /// Answer one chat turn.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, FinchError> {
        request.validate()?;

        let user_id = request.user_id.as_str();
        let conversation_id = request.conversation_id.as_str();
        let persona = request
            .persona_id
            .clone()
            .unwrap_or_else(|| self.settings.default_persona.clone());

        if let Some(limiter) = &self.limiter
            && let Err(e) = limiter.check(user_id).await
        {
            if matches!(e, FinchError::RateLimited { .. }) {
                self.metrics.emit(MetricEvent::count(RATE_LIMITED_TOTAL, &[]));
            }
            return Err(e);
        }

        let message = if self.settings.mask_pii {
            let masked = mask_pii(&request.message, MaskStrategy::Last4);
            if !masked.found.is_empty() {
                debug!(user_id, found = masked.found.len(), "masked PII in user message");
            }
            masked.text
        } else {
            request.message.clone()
        };

        let recalls = self.recall(user_id, &message).await;
        let summary = self.summarizer.get_summary(user_id, conversation_id).await?;
        let history = self
            .memory
            .recent_messages(user_id, conversation_id, self.settings.history_limit)
            .await?;

        let built = self.assemble(&summary, &recalls, &history, &message);
        if built.over_limit {
            self.metrics
                .emit(MetricEvent::count(CONTEXT_OVER_LIMIT_TOTAL, &[]));
        }

        let reply = self.complete(&built).await?;

        let user_message_id = self
            .memory
            .save_message(
                user_id,
                conversation_id,
                Role::User,
                &message,
                Some(&persona),
            )
            .await?;
        self.memory
            .save_message(
                user_id,
                conversation_id,
                Role::Assistant,
                &reply,
                Some(&persona),
            )
            .await?;

        if self.settings.memory_enabled {
            self.extract(user_id, &message, user_message_id.as_str())
                .await;
        }

        let summary_updated = if self.settings.summary_enabled {
            self.roll_summary(user_id, conversation_id, &summary).await
        } else {
            false
        };

        self.metrics.emit(MetricEvent::count(
            CHAT_TURNS_TOTAL,
            &[("persona", persona.as_str())],
        ));
        info!(
            user_id,
            conversation_id,
            persona = %persona,
            over_limit = built.over_limit,
            summary_updated,
            "chat turn complete"
        );

        Ok(ChatResponse {
            reply,
            over_limit: built.over_limit,
            summary_updated,
            persona_id: persona,
        })
    }

    /// Recalled fact texts for `message`. Recall failures degrade to none.
    async fn recall(&self, user_id: &str, message: &str) -> Vec<String> {
        if !self.settings.memory_enabled {
            return Vec::new();
        }
        match self
            .memory
            .search_memory(user_id, message, self.memory.top_k())
            .await
        {
            Ok(hits) => hits
                .into_iter()
                .map(|h| cap_tokens(&h.text, MAX_ENTRY_TOKENS))
                .collect(),
            Err(e) => {
                warn!(user_id, error = %e, "memory recall failed, continuing without recalls");
                Vec::new()
            }
        }
    }

    fn assemble(
        &self,
        summary: &str,
        recalls: &[String],
        stored: &[StoredMessage],
        message: &str,
    ) -> BuiltContext {
        let mut system = vec![self.settings.system_prompt.clone()];
        if !summary.trim().is_empty() {
            system.push(format!(
                "Conversation summary: {}",
                cap_tokens(summary, MAX_ENTRY_TOKENS)
            ));
        }

        let mut history: Vec<ChatMessage> = stored.iter().filter_map(to_chat_message).collect();
        history.push(ChatMessage::user(message));

        self.builder.build(&system, recalls, &history)
    }

    async fn complete(&self, built: &BuiltContext) -> Result<String, FinchError> {
        let request = CompletionRequest {
            model: self.settings.chat_model.clone(),
            system_prompt: None,
            messages: built
                .system
                .iter()
                .chain(&built.messages)
                .cloned()
                .collect(),
            temperature: Some(self.settings.temperature),
            max_tokens: self.settings.max_tokens,
        };

        let started = Instant::now();
        let response = retry_with_backoff(&self.retry, "complete", || {
            with_timeout(
                self.settings.completion_timeout,
                "complete",
                self.provider.complete(request.clone()),
            )
        })
        .await?;

        self.metrics.emit(MetricEvent::observe(
            COMPLETION_LATENCY_SECONDS,
            started.elapsed().as_secs_f64(),
            &[],
        ));
        debug!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "completion received"
        );
        Ok(response.content)
    }

    /// Extract facts from the user's message and save them as one fact
    /// sourced from that message.
    async fn extract(&self, user_id: &str, message: &str, source_message_id: &str) {
        let facts = extract_facts(&[ChatMessage::user(message)]);
        if facts.is_empty() {
            return;
        }
        let fact = facts
            .iter()
            .map(|f| f.render())
            .collect::<Vec<_>>()
            .join("; ");

        let memory = Arc::clone(&self.memory);
        let metrics = self.metrics.clone();
        let user_id = user_id.to_string();
        let source_message_id = source_message_id.to_string();
        let task = async move {
            match memory.save_fact(&user_id, &fact, &source_message_id).await {
                Ok(outcome) => {
                    metrics.emit(MetricEvent::count(
                        FACTS_TOTAL,
                        &[("outcome", outcome.label())],
                    ));
                    debug!(
                        user_id = %user_id,
                        fact_id = outcome.fact_id(),
                        outcome = outcome.label(),
                        "fact saved"
                    );
                }
                Err(e) => {
                    metrics.emit(MetricEvent::count(FACTS_TOTAL, &[("outcome", "failed")]));
                    warn!(
                        user_id = %user_id,
                        source_message_id = %source_message_id,
                        error = %e,
                        "fact extraction failed (non-fatal)"
                    );
                }
            }
        };

        if self.settings.background_extraction {
            self.background.spawn(task);
        } else {
            task.await;
        }
    }

    /// Roll and store the summary. Returns whether the stored text changed.
    async fn roll_summary(&self, user_id: &str, conversation_id: &str, previous: &str) -> bool {
        let turns = match self
            .memory
            .recent_messages(user_id, conversation_id, self.settings.recent_turns)
            .await
        {
            Ok(rows) => rows.iter().filter_map(to_chat_message).collect::<Vec<_>>(),
            Err(e) => {
                warn!(user_id, conversation_id, error = %e, "could not load turns for summary");
                return false;
            }
        };

        let rolled = match self
            .summarizer
            .roll_summary(user_id, conversation_id, previous, &turns)
            .await
        {
            Ok(s) => s,
            Err(e) => {
                warn!(user_id, conversation_id, error = %e, "summary update failed, keeping previous");
                return false;
            }
        };

        if rolled.is_empty() || rolled == previous {
            return false;
        }
        match self
            .summarizer
            .save_summary(user_id, conversation_id, &rolled)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(user_id, conversation_id, error = %e, "failed to store summary");
                false
            }
        }
    }
}

fn to_chat_message(row: &StoredMessage) -> Option<ChatMessage> {
    match Role::from_str(&row.role) {
        Ok(role) => Some(ChatMessage::new(role, row.content.clone())),
        Err(_) => {
            warn!(message_id = %row.id, role = %row.role, "skipping message with unknown role");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: &str, content: &str) -> StoredMessage {
        StoredMessage {
            id: "m1".into(),
            user_id: "u1".into(),
            conversation_id: "c1".into(),
            role: role.into(),
            content: content.into(),
            persona_id: None,
            created_at: "2026-03-01T12:00:00.000Z".into(),
        }
    }

    #[test]
    fn stored_rows_convert_to_chat_messages() {
        assert_eq!(
            to_chat_message(&row("assistant", "hi")),
            Some(ChatMessage::assistant("hi"))
        );
        assert_eq!(to_chat_message(&row("narrator", "hi")), None);
    }

    #[test]
    fn settings_follow_config() {
        let config = FinchConfig::default();
        let settings = TurnSettings::from_config(&config);
        assert_eq!(settings.completion_timeout, Duration::from_secs(25));
        assert_eq!(settings.history_limit, 50);
        assert_eq!(settings.default_persona, "prime");
        assert!(settings.mask_pii);
        assert!(!settings.background_extraction);
    }
}
