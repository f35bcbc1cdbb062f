// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rolling conversation summaries, one row per `(user_id, conversation_id)`.

use finch_core::FinchError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// The stored summary, if any.
pub async fn get_summary(
    db: &Database,
    user_id: &str,
    conversation_id: &str,
) -> Result<Option<String>, FinchError> {
    let user_id = user_id.to_string();
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let summary = conn
                .query_row(
                    "SELECT summary FROM conversation_summaries
                     WHERE user_id = ?1 AND conversation_id = ?2",
                    params![user_id, conversation_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(summary)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace the summary.
pub async fn upsert_summary(
    db: &Database,
    user_id: &str,
    conversation_id: &str,
    summary: &str,
    updated_at: &str,
) -> Result<(), FinchError> {
    let user_id = user_id.to_string();
    let conversation_id = conversation_id.to_string();
    let summary = summary.to_string();
    let updated_at = updated_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversation_summaries (user_id, conversation_id, summary, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id, conversation_id) DO UPDATE SET
                     summary = excluded.summary,
                     updated_at = excluded.updated_at",
                params![user_id, conversation_id, summary, updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
