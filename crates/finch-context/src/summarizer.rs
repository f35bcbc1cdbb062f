// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rolling per-conversation summary.
//!
//! [`Summarizer::roll_summary`] only produces text; persisting it is a
//! separate [`Summarizer::save_summary`] call, so a failed rollup never
//! disturbs the stored summary.

use std::sync::Arc;

use finch_config::model::SummaryConfig;
use finch_core::{ChatMessage, CompletionRequest, FinchError, ProviderAdapter};
use finch_resilience::{RetryPolicy, retry_with_backoff};
use finch_storage::Database;
use finch_storage::models::now_timestamp;
use finch_storage::queries::summaries;
use tracing::{debug, info, warn};

/// Maintains one summary per (user, conversation).
pub struct Summarizer {
    db: Database,
    provider: Arc<dyn ProviderAdapter>,
    model: String,
    max_words: u32,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl Summarizer {
    pub fn new(
        db: Database,
        provider: Arc<dyn ProviderAdapter>,
        model: impl Into<String>,
        config: &SummaryConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            db,
            provider,
            model: model.into(),
            max_words: config.max_words,
            max_tokens: config.max_tokens,
            retry,
        }
    }

    /// The stored summary, or an empty string when none exists yet.
    pub async fn get_summary(&self, user_id: &str, conversation_id: &str) -> Result<String, FinchError> {
        Ok(summaries::get_summary(&self.db, user_id, conversation_id)
            .await?
            .unwrap_or_default())
    }

    /// Replace the stored summary.
    pub async fn save_summary(
        &self,
        user_id: &str,
        conversation_id: &str,
        summary: &str,
    ) -> Result<(), FinchError> {
        summaries::upsert_summary(&self.db, user_id, conversation_id, summary, &now_timestamp())
            .await?;
        debug!(user_id, conversation_id, chars = summary.len(), "summary saved");
        Ok(())
    }

    fn instruction(&self) -> String {
        format!(
            "You maintain a compact running summary of a conversation. Keep it under {} words, \
             factual, reusable, no fluff.",
            self.max_words
        )
    }

    /// Fold `last_turns` into `previous` with one completion call.
    ///
    /// Returns the trimmed reply, or `previous` unchanged when the reply is
    /// empty. Nothing is written.
    pub async fn roll_summary(
        &self,
        user_id: &str,
        conversation_id: &str,
        previous: &str,
        last_turns: &[ChatMessage],
    ) -> Result<String, FinchError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            system_prompt: None,
            messages: vec![
                ChatMessage::system(self.instruction()),
                ChatMessage::user(render_rollup_input(previous, last_turns)),
            ],
            temperature: Some(0.0),
            max_tokens: self.max_tokens,
        };

        let response = retry_with_backoff(&self.retry, "summarize", || {
            self.provider.complete(request.clone())
        })
        .await?;

        let summary = response.content.trim();
        if summary.is_empty() {
            warn!(user_id, conversation_id, "empty summary reply, keeping previous");
            return Ok(previous.to_string());
        }

        info!(
            user_id,
            conversation_id,
            turns = last_turns.len(),
            output_tokens = response.usage.output_tokens,
            "summary rolled"
        );
        Ok(summary.to_string())
    }
}

fn render_rollup_input(previous: &str, last_turns: &[ChatMessage]) -> String {
    let previous = if previous.trim().is_empty() {
        "(none)"
    } else {
        previous
    };
    let turns = last_turns
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.content))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Previous summary:\n{previous}\n\nLatest turns:\n{turns}")
}
