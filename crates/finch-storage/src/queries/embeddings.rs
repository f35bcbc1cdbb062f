// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding vectors keyed by `(user_id, source_message_id)`.

use finch_core::FinchError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::EmbeddingRow;

/// Insert or overwrite the vector for a source message.
pub async fn upsert_embedding(db: &Database, row: &EmbeddingRow) -> Result<(), FinchError> {
    let row = row.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO memory_embeddings (user_id, source_message_id, embedding, text, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id, source_message_id) DO UPDATE SET
                     embedding = excluded.embedding,
                     text = excluded.text,
                     updated_at = excluded.updated_at",
                params![
                    row.user_id,
                    row.source_message_id,
                    row.embedding,
                    row.text,
                    row.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All vectors owned by a user. Other users' rows are never returned.
pub async fn embeddings_for_user(
    db: &Database,
    user_id: &str,
) -> Result<Vec<EmbeddingRow>, FinchError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, source_message_id, embedding, text, updated_at
                 FROM memory_embeddings WHERE user_id = ?1",
            )?;
            let rows = stmt
                .query_map(params![user_id], |row| {
                    Ok(EmbeddingRow {
                        user_id: row.get(0)?,
                        source_message_id: row.get(1)?,
                        embedding: row.get(2)?,
                        text: row.get(3)?,
                        updated_at: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}
