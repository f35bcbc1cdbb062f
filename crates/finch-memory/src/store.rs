// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message log, deduplicated facts, embeddings and similarity recall.

use std::sync::Arc;

use finch_config::model::MemoryConfig;
use finch_core::{EmbeddingAdapter, EmbeddingInput, FinchError, MessageId, Role};
use finch_resilience::{RetryPolicy, retry_with_backoff};
use finch_storage::queries::{embeddings, facts, messages};
use finch_storage::{Database, EmbeddingRow, FactRow, StoredMessage, now_timestamp};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::fingerprint::{fingerprint, truncate_chars};
use crate::types::{FactOutcome, RecalledMemory, blob_to_vec, cosine_similarity, vec_to_blob};

/// Persistent memory for one database.
///
/// All recall goes through [`search_memory`](Self::search_memory); there is
/// no listing API for facts.
pub struct MemoryStore {
    db: Database,
    embedder: Arc<dyn EmbeddingAdapter>,
    retry: RetryPolicy,
    top_k: usize,
    min_similarity: f32,
    max_embed_chars: usize,
}

impl MemoryStore {
    pub fn new(
        db: Database,
        embedder: Arc<dyn EmbeddingAdapter>,
        config: &MemoryConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            db,
            embedder,
            retry,
            top_k: config.top_k,
            min_similarity: config.min_similarity,
            max_embed_chars: config.max_embed_chars,
        }
    }

    /// Default number of hits returned by [`search_memory`](Self::search_memory).
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Append a message to the conversation log and return its new id.
    pub async fn save_message(
        &self,
        user_id: &str,
        conversation_id: &str,
        role: Role,
        content: &str,
        persona_id: Option<&str>,
    ) -> Result<MessageId, FinchError> {
        let msg = StoredMessage {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            conversation_id: conversation_id.to_string(),
            role: role.as_str().to_string(),
            content: content.to_string(),
            persona_id: persona_id.map(str::to_string),
            created_at: now_timestamp(),
        };
        messages::insert_message(&self.db, &msg).await?;
        debug!(user_id, conversation_id, message_id = %msg.id, role = role.as_str(), "message saved");
        Ok(MessageId(msg.id))
    }

    /// The newest `limit` messages of a conversation, oldest first.
    pub async fn recent_messages(
        &self,
        user_id: &str,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, FinchError> {
        messages::recent_messages(&self.db, user_id, conversation_id, limit).await
    }

    pub async fn message_count(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<u64, FinchError> {
        messages::count_messages(&self.db, user_id, conversation_id).await
    }

    /// Store a fact unless the user already has one with the same normalized text.
    ///
    /// Duplicates are linked to the new source message and return without
    /// calling the embedding capability. Novel facts are embedded and the
    /// vector is upserted under `(user_id, source_message_id)`. When embedding
    /// fails the new fact row is removed again before the error is returned.
    pub async fn save_fact(
        &self,
        user_id: &str,
        fact: &str,
        source_message_id: &str,
    ) -> Result<FactOutcome, FinchError> {
        let text = fact.trim();
        if text.is_empty() {
            return Err(FinchError::Validation("fact text is empty".to_string()));
        }

        let row = FactRow {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            fact: text.to_string(),
            source_message_id: source_message_id.to_string(),
            fingerprint: fingerprint(text),
            created_at: now_timestamp(),
        };

        match facts::insert_fact(&self.db, &row).await {
            Ok(()) => {}
            Err(FinchError::DuplicateKey { .. }) => {
                let existing = facts::get_fact_by_fingerprint(&self.db, user_id, &row.fingerprint)
                    .await?
                    .ok_or_else(|| {
                        FinchError::Internal(format!(
                            "duplicate fingerprint {} has no fact row",
                            row.fingerprint
                        ))
                    })?;
                facts::link_source(&self.db, &existing.id, source_message_id).await?;
                debug!(user_id, fact_id = %existing.id, source_message_id, "duplicate fact linked");
                return Ok(FactOutcome::Duplicate {
                    fact_id: existing.id,
                });
            }
            Err(e) => return Err(e),
        }

        // An unembedded fact is unrecallable and would shadow later saves.
        if let Err(e) = self.embed_and_link(&row, text).await {
            if let Err(cleanup) = facts::delete_fact(&self.db, &row.id).await {
                warn!(user_id, fact_id = %row.id, error = %cleanup, "failed to roll back fact");
            }
            return Err(e);
        }

        info!(user_id, fact_id = %row.id, source_message_id, "fact stored");
        Ok(FactOutcome::Stored { fact_id: row.id })
    }

    async fn embed_and_link(&self, row: &FactRow, text: &str) -> Result<(), FinchError> {
        facts::link_source(&self.db, &row.id, &row.source_message_id).await?;
        let vector = self.embed_text(text).await?;
        embeddings::upsert_embedding(
            &self.db,
            &EmbeddingRow {
                user_id: row.user_id.clone(),
                source_message_id: row.source_message_id.clone(),
                embedding: vec_to_blob(&vector),
                text: text.to_string(),
                updated_at: now_timestamp(),
            },
        )
        .await?;
        debug!(fact_id = %row.id, dims = vector.len(), "fact embedded");
        Ok(())
    }

    /// Embed `text`, truncated to the configured character limit.
    ///
    /// Capability failures are retried per the policy, then propagated unchanged.
    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>, FinchError> {
        let input = truncate_chars(text, self.max_embed_chars).to_string();
        let output = retry_with_backoff(&self.retry, "embed", || {
            let input = EmbeddingInput {
                texts: vec![input.clone()],
            };
            let embedder = Arc::clone(&self.embedder);
            async move { embedder.embed(input).await }
        })
        .await?;

        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| FinchError::provider("embedding response contained no vectors"))
    }

    /// The user's stored texts most similar to `query`, best first.
    ///
    /// At most `top_k` hits are returned. Hits scoring below the configured
    /// floor are dropped; a floor of 0.0 keeps everything.
    pub async fn search_memory(
        &self,
        user_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RecalledMemory>, FinchError> {
        if query.trim().is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self.embed_text(query).await?;
        let rows = embeddings::embeddings_for_user(&self.db, user_id).await?;
        let candidates = rows.len();

        let mut hits: Vec<RecalledMemory> = rows
            .into_iter()
            .map(|row| RecalledMemory {
                score: cosine_similarity(&query_vec, &blob_to_vec(&row.embedding)),
                source_message_id: row.source_message_id,
                text: row.text,
            })
            .filter(|hit| self.min_similarity <= 0.0 || hit.score >= self.min_similarity)
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);

        debug!(user_id, candidates, returned = hits.len(), "memory search complete");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finch_test_utils::MockEmbedder;

    async fn store_with(config: MemoryConfig) -> (MemoryStore, Arc<MockEmbedder>) {
        let db = Database::open_in_memory().await.unwrap();
        let embedder = Arc::new(MockEmbedder::new());
        let store = MemoryStore::new(db, embedder.clone(), &config, RetryPolicy::no_retry());
        (store, embedder)
    }

    async fn store() -> (MemoryStore, Arc<MockEmbedder>) {
        store_with(MemoryConfig::default()).await
    }

    #[tokio::test]
    async fn duplicate_fact_is_stored_and_embedded_once() {
        let (store, embedder) = store().await;

        let first = store
            .save_fact("u1", "Pays rent on the 1st", "msg1")
            .await
            .unwrap();
        let second = store
            .save_fact("u1", "  pays rent on the 1st  ", "msg2")
            .await
            .unwrap();

        assert!(matches!(first, FactOutcome::Stored { .. }));
        assert_eq!(
            second,
            FactOutcome::Duplicate {
                fact_id: first.fact_id().to_string()
            }
        );
        assert_eq!(embedder.call_count(), 1);
        assert_eq!(facts::count_facts(&store.db, "u1").await.unwrap(), 1);
        assert_eq!(
            facts::fact_sources(&store.db, first.fact_id()).await.unwrap(),
            vec!["msg1", "msg2"]
        );
    }

    #[tokio::test]
    async fn same_fact_for_another_user_is_novel() {
        let (store, embedder) = store().await;
        store.save_fact("u1", "Banks with Chase", "m1").await.unwrap();
        let other = store.save_fact("u2", "Banks with Chase", "m9").await.unwrap();
        assert!(matches!(other, FactOutcome::Stored { .. }));
        assert_eq!(embedder.call_count(), 2);
    }

    #[tokio::test]
    async fn blank_fact_is_rejected() {
        let (store, embedder) = store().await;
        let err = store.save_fact("u1", "   ", "m1").await.unwrap_err();
        assert!(matches!(err, FinchError::Validation(_)));
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let (store, embedder) = store().await;
        embedder.fail_next(FinchError::provider("embeddings down"));
        let err = store.save_fact("u1", "Owns a Tesla", "m1").await.unwrap_err();
        assert!(err.is_capability_failure());
    }

    #[tokio::test]
    async fn failed_embedding_leaves_fact_retryable() {
        let (store, embedder) = store().await;
        embedder.fail_next(FinchError::provider("embeddings down"));
        assert!(
            store
                .save_fact("u1", "rent is 1200 per month", "m1")
                .await
                .is_err()
        );
        assert_eq!(facts::count_facts(&store.db, "u1").await.unwrap(), 0);

        let retried = store
            .save_fact("u1", "rent is 1200 per month", "m2")
            .await
            .unwrap();
        assert!(matches!(retried, FactOutcome::Stored { .. }));
        assert_eq!(
            facts::fact_sources(&store.db, retried.fact_id()).await.unwrap(),
            vec!["m2"]
        );

        let hits = store
            .search_memory("u1", "rent is 1200 per month", 6)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source_message_id, "m2");
    }

    #[tokio::test]
    async fn only_candidate_is_found_by_its_own_text() {
        let (store, _) = store().await;
        store
            .save_fact("u1", "insurance renews every March", "m1")
            .await
            .unwrap();

        let hits = store
            .search_memory("u1", "insurance renews every March", 6)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source_message_id, "m1");
        assert_eq!(hits[0].text, "insurance renews every March");
        assert!((hits[0].score - 1.0).abs() < 1e-5, "score {}", hits[0].score);
    }

    #[tokio::test]
    async fn embed_input_is_truncated_on_char_boundary() {
        let (store, embedder) = store().await;
        let long = "é".repeat(2500);
        store.embed_text(&long).await.unwrap();
        let seen = embedder.inputs();
        assert_eq!(seen[0].chars().count(), 2000);
    }

    #[tokio::test]
    async fn stored_fact_is_recalled_first() {
        let (store, _) = store().await;
        store
            .save_fact("u1", "rent is 1200 per month", "m1")
            .await
            .unwrap();
        store
            .save_fact("u1", "favorite grocery store is Safeway", "m2")
            .await
            .unwrap();

        let hits = store.search_memory("u1", "how much is rent", 6).await.unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].source_message_id, "m1");
        assert_eq!(hits[0].text, "rent is 1200 per month");
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn recall_is_scoped_to_user_and_bounded_by_top_k() {
        let (store, _) = store_with(MemoryConfig {
            min_similarity: 0.0,
            ..MemoryConfig::default()
        })
        .await;
        for i in 0..5 {
            store
                .save_fact("u1", &format!("budget note {i}"), &format!("m{i}"))
                .await
                .unwrap();
        }
        store.save_fact("u2", "budget secret", "x1").await.unwrap();

        let hits = store.search_memory("u1", "budget", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.source_message_id.starts_with('m')));
    }

    #[tokio::test]
    async fn similarity_floor_drops_weak_hits() {
        let (store, _) = store().await;
        store
            .save_fact("u1", "subscription to Netflix", "m1")
            .await
            .unwrap();
        let hits = store
            .search_memory("u1", "completely unrelated words", 6)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn empty_store_returns_nothing() {
        let (store, _) = store().await;
        assert!(store.search_memory("u1", "anything", 6).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn messages_round_trip_with_persona() {
        let (store, _) = store().await;
        let id = store
            .save_message("u1", "c1", Role::User, "hello", Some("prime"))
            .await
            .unwrap();
        store
            .save_message("u1", "c1", Role::Assistant, "hi!", None)
            .await
            .unwrap();

        let history = store.recent_messages("u1", "c1", 50).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, id.as_str());
        assert_eq!(history[0].persona_id.as_deref(), Some("prime"));
        assert_eq!(history[1].role, "assistant");
        assert_eq!(store.message_count("u1", "c1").await.unwrap(), 2);
    }
}
