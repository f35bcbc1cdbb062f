// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token-budgeted prompt assembly.
//!
//! History is filled newest-first into whatever budget remains after the
//! system entries, recalled facts and the answer reserve. Older turns that do
//! not fit are dropped whole, never truncated.

use finch_config::model::ContextConfig;
use finch_core::ChatMessage;
use tracing::debug;

/// Approximate token count of `text`: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> u32 {
    let chars = text.chars().count();
    u32::try_from(chars.div_ceil(4)).unwrap_or(u32::MAX)
}

/// Cut `text` to roughly `max_tokens` tokens, appending `...` when cut.
pub fn cap_tokens(text: &str, max_tokens: u32) -> String {
    let max_chars = max_tokens as usize * 4;
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Output of [`ContextBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltContext {
    /// System-role entries, in input order.
    pub system: Vec<ChatMessage>,
    /// Recalled-fact entries followed by the kept history, oldest first.
    pub messages: Vec<ChatMessage>,
    /// True when at least one history message was dropped.
    pub over_limit: bool,
    /// Estimated tokens of the kept history.
    pub history_tokens: u32,
}

impl BuiltContext {
    /// Number of history messages that made it into the prompt.
    pub fn kept_history(&self, recall_count: usize) -> usize {
        self.messages.len().saturating_sub(recall_count)
    }
}

/// Assembles prompts under a fixed token budget.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    total_budget: u32,
    reserve: u32,
    recall_prefix: String,
}

impl ContextBuilder {
    pub fn new(total_budget: u32, reserve: u32) -> Self {
        Self {
            total_budget,
            reserve,
            recall_prefix: "Relevant memory: ".to_string(),
        }
    }

    pub fn from_config(config: &ContextConfig) -> Self {
        Self {
            total_budget: config.total_budget,
            reserve: config.reserve,
            recall_prefix: config.recall_prefix.clone(),
        }
    }

    /// Tokens left for history once `system` and `recalls` are accounted for.
    /// Negative when they already exceed the budget.
    fn remaining(&self, system: &[ChatMessage], recalls: &[ChatMessage]) -> i64 {
        let fixed: i64 = system
            .iter()
            .chain(recalls)
            .map(|m| i64::from(estimate_tokens(&m.content)))
            .sum();
        i64::from(self.total_budget) - fixed - i64::from(self.reserve)
    }

    /// Build a prompt from system instructions, recalled facts and the full
    /// chronological history.
    ///
    /// Never fails: when the budget is exhausted, history is dropped from the
    /// oldest end and `over_limit` is set.
    pub fn build(&self, system: &[String], recalls: &[String], history: &[ChatMessage]) -> BuiltContext {
        let system: Vec<ChatMessage> = system.iter().map(ChatMessage::system).collect();
        let recall_entries: Vec<ChatMessage> = recalls
            .iter()
            .map(|r| ChatMessage::system(format!("{}{r}", self.recall_prefix)))
            .collect();

        let remaining = self.remaining(&system, &recall_entries);

        let mut kept = Vec::new();
        let mut used: i64 = 0;
        if remaining > 0 {
            for message in history.iter().rev() {
                let tokens = i64::from(estimate_tokens(&message.content));
                if used + tokens > remaining {
                    break;
                }
                used += tokens;
                kept.push(message.clone());
            }
        }
        kept.reverse();

        let over_limit = kept.len() < history.len();
        debug!(
            remaining,
            kept = kept.len(),
            dropped = history.len() - kept.len(),
            "context assembled"
        );

        let mut messages = recall_entries;
        messages.extend(kept);

        BuiltContext {
            system,
            messages,
            over_limit,
            history_tokens: u32::try_from(used).unwrap_or(u32::MAX),
        }
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}
