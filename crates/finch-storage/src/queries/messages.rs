// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation log operations. Messages are never updated or deleted.

use finch_core::FinchError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::StoredMessage;

/// Append a message.
pub async fn insert_message(db: &Database, msg: &StoredMessage) -> Result<(), FinchError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, user_id, conversation_id, role, content, persona_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    msg.id,
                    msg.user_id,
                    msg.conversation_id,
                    msg.role,
                    msg.content,
                    msg.persona_id,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The newest `limit` messages of a conversation, returned oldest first.
///
/// Ties on `created_at` fall back to insertion order.
pub async fn recent_messages(
    db: &Database,
    user_id: &str,
    conversation_id: &str,
    limit: usize,
) -> Result<Vec<StoredMessage>, FinchError> {
    let user_id = user_id.to_string();
    let conversation_id = conversation_id.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, conversation_id, role, content, persona_id, created_at
                 FROM messages WHERE user_id = ?1 AND conversation_id = ?2
                 ORDER BY created_at DESC, rowid DESC LIMIT ?3",
            )?;
            let mut messages = stmt
                .query_map(params![user_id, conversation_id, limit], |row| {
                    Ok(StoredMessage {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        conversation_id: row.get(2)?,
                        role: row.get(3)?,
                        content: row.get(4)?,
                        persona_id: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            messages.reverse();
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of messages stored for a conversation.
pub async fn count_messages(
    db: &Database,
    user_id: &str,
    conversation_id: &str,
) -> Result<u64, FinchError> {
    let user_id = user_id.to_string();
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE user_id = ?1 AND conversation_id = ?2",
                params![user_id, conversation_id],
                |row| row.get(0),
            )?;
            Ok(count.max(0) as u64)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_msg(id: &str, conversation: &str, role: &str, timestamp: &str) -> StoredMessage {
        StoredMessage {
            id: id.to_string(),
            user_id: "u1".to_string(),
            conversation_id: conversation.to_string(),
            role: role.to_string(),
            content: format!("content of {id}"),
            persona_id: None,
            created_at: timestamp.to_string(),
        }
    }

    #[tokio::test]
    async fn recent_messages_are_chronological() {
        let db = Database::open_in_memory().await.unwrap();
        insert_message(&db, &make_msg("m1", "c1", "user", "2026-01-01T00:00:01.000Z"))
            .await
            .unwrap();
        insert_message(&db, &make_msg("m2", "c1", "assistant", "2026-01-01T00:00:02.000Z"))
            .await
            .unwrap();
        insert_message(&db, &make_msg("m3", "c1", "user", "2026-01-01T00:00:03.000Z"))
            .await
            .unwrap();

        let messages = recent_messages(&db, "u1", "c1", 10).await.unwrap();
        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert_eq!(messages[1].role, "assistant");
    }

    #[tokio::test]
    async fn limit_keeps_the_newest_messages() {
        let db = Database::open_in_memory().await.unwrap();
        for i in 0..5 {
            let msg = make_msg(
                &format!("m{i}"),
                "c1",
                "user",
                &format!("2026-01-01T00:00:0{i}.000Z"),
            );
            insert_message(&db, &msg).await.unwrap();
        }

        let messages = recent_messages(&db, "u1", "c1", 3).await.unwrap();
        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn identical_timestamps_keep_insertion_order() {
        let db = Database::open_in_memory().await.unwrap();
        let ts = "2026-01-01T00:00:00.000Z";
        insert_message(&db, &make_msg("b", "c1", "user", ts)).await.unwrap();
        insert_message(&db, &make_msg("a", "c1", "assistant", ts)).await.unwrap();

        let messages = recent_messages(&db, "u1", "c1", 10).await.unwrap();
        assert_eq!(messages[0].id, "b");
        assert_eq!(messages[1].id, "a");
    }

    #[tokio::test]
    async fn conversations_are_isolated() {
        let db = Database::open_in_memory().await.unwrap();
        insert_message(&db, &make_msg("m1", "c1", "user", "2026-01-01T00:00:01.000Z"))
            .await
            .unwrap();
        insert_message(&db, &make_msg("m2", "c2", "user", "2026-01-01T00:00:02.000Z"))
            .await
            .unwrap();

        assert_eq!(count_messages(&db, "u1", "c1").await.unwrap(), 1);
        assert_eq!(count_messages(&db, "u1", "c2").await.unwrap(), 1);
        assert_eq!(count_messages(&db, "u2", "c1").await.unwrap(), 0);
        assert!(recent_messages(&db, "u1", "c3", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_message_id_is_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        let msg = make_msg("m1", "c1", "user", "2026-01-01T00:00:01.000Z");
        insert_message(&db, &msg).await.unwrap();
        let err = insert_message(&db, &msg).await.unwrap_err();
        assert!(err.is_duplicate_key());
    }
}
