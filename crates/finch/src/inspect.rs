// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only commands: `finch recall`, `finch summary` and `finch config`.

use std::sync::{Arc, RwLock};

use colored::Colorize;
use finch_config::FinchConfig;
use finch_core::{EmbeddingAdapter, FinchError, StorageAdapter};
use finch_memory::{MemoryStore, RecalledMemory};
use finch_resilience::RetryPolicy;
use finch_storage::queries::summaries;

use crate::app::{open_provider, open_storage};

/// Print the user's stored facts closest to `query`.
pub async fn run_recall(
    config: FinchConfig,
    secrets: Arc<RwLock<Vec<String>>>,
    user_id: String,
    query: String,
    top_k: Option<usize>,
) -> Result<(), FinchError> {
    let (storage, db) = open_storage(&config).await?;
    let embedder: Arc<dyn EmbeddingAdapter> = open_provider(&config, &secrets)?;
    let memory = MemoryStore::new(
        db,
        embedder,
        &config.memory,
        RetryPolicy::from_config(&config.resilience),
    );

    let result = memory
        .search_memory(&user_id, &query, top_k.unwrap_or(memory.top_k()))
        .await;
    storage.close().await?;

    let hits = result?;
    if hits.is_empty() {
        println!("{}", "no matching memories".dimmed());
    }
    for line in render_hits(&hits) {
        println!("{line}");
    }
    Ok(())
}

/// Print the stored summary of a conversation.
pub async fn run_summary(
    config: FinchConfig,
    user_id: String,
    conversation_id: String,
) -> Result<(), FinchError> {
    let (storage, db) = open_storage(&config).await?;
    let summary = summaries::get_summary(&db, &user_id, &conversation_id).await;
    storage.close().await?;

    match summary? {
        Some(text) if !text.is_empty() => println!("{text}"),
        _ => println!("{}", "(no summary yet)".dimmed()),
    }
    Ok(())
}

/// Print the effective configuration as TOML.
pub fn run_config(config: &FinchConfig) -> Result<(), FinchError> {
    let text = finch_config::to_toml_string(config)
        .map_err(|e| FinchError::Internal(format!("failed to render configuration: {e}")))?;
    print!("{text}");
    Ok(())
}

fn render_hits(hits: &[RecalledMemory]) -> Vec<String> {
    hits.iter()
        .map(|h| format!("{:.3}  {}", h.score, h.text))
        .collect()
}
