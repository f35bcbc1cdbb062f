// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fact rows and their source links.

use finch_core::FinchError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{FactRow, now_timestamp};

/// Insert a fact.
///
/// A second fact with the same `(user_id, fingerprint)` fails with
/// [`FinchError::DuplicateKey`]; the stored row is left untouched.
pub async fn insert_fact(db: &Database, fact: &FactRow) -> Result<(), FinchError> {
    let fact = fact.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO memory_facts (id, user_id, fact, source_message_id, fingerprint, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    fact.id,
                    fact.user_id,
                    fact.fact,
                    fact.source_message_id,
                    fact.fingerprint,
                    fact.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Look up a user's fact by fingerprint.
pub async fn get_fact_by_fingerprint(
    db: &Database,
    user_id: &str,
    fingerprint: &str,
) -> Result<Option<FactRow>, FinchError> {
    let user_id = user_id.to_string();
    let fingerprint = fingerprint.to_string();
    db.connection()
        .call(move |conn| {
            let fact = conn
                .query_row(
                    "SELECT id, user_id, fact, source_message_id, fingerprint, created_at
                     FROM memory_facts WHERE user_id = ?1 AND fingerprint = ?2",
                    params![user_id, fingerprint],
                    |row| {
                        Ok(FactRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            fact: row.get(2)?,
                            source_message_id: row.get(3)?,
                            fingerprint: row.get(4)?,
                            created_at: row.get(5)?,
                        })
                    },
                )
                .optional()?;
            Ok(fact)
        })
        .await
        .map_err(map_tr_err)
}

/// Record that `source_message_id` produced `fact_id`. Repeats are ignored.
pub async fn link_source(
    db: &Database,
    fact_id: &str,
    source_message_id: &str,
) -> Result<(), FinchError> {
    let fact_id = fact_id.to_string();
    let source_message_id = source_message_id.to_string();
    let created_at = now_timestamp();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO memory_fact_sources (fact_id, source_message_id, created_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(fact_id, source_message_id) DO NOTHING",
                params![fact_id, source_message_id, created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Every message linked to a fact, oldest link first.
pub async fn fact_sources(db: &Database, fact_id: &str) -> Result<Vec<String>, FinchError> {
    let fact_id = fact_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT source_message_id FROM memory_fact_sources
                 WHERE fact_id = ?1 ORDER BY created_at ASC, rowid ASC",
            )?;
            let sources = stmt
                .query_map(params![fact_id], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(sources)
        })
        .await
        .map_err(map_tr_err)
}

/// Remove a fact together with its source links, in one transaction.
pub async fn delete_fact(db: &Database, fact_id: &str) -> Result<(), FinchError> {
    let fact_id = fact_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM memory_fact_sources WHERE fact_id = ?1",
                params![fact_id],
            )?;
            tx.execute("DELETE FROM memory_facts WHERE id = ?1", params![fact_id])?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Number of distinct facts stored for a user.
pub async fn count_facts(db: &Database, user_id: &str) -> Result<u64, FinchError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM memory_facts WHERE user_id = ?1",
                params![user_id],
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

    fn fact(id: &str, user: &str, fingerprint: &str) -> FactRow {
        FactRow {
            id: id.to_string(),
            user_id: user.to_string(),
            fact: "Rent is 1200 per month".to_string(),
            source_message_id: "m1".to_string(),
            fingerprint: fingerprint.to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn second_insert_with_same_fingerprint_is_duplicate() {
        let db = Database::open_in_memory().await.unwrap();
        insert_fact(&db, &fact("f1", "u1", "abc")).await.unwrap();

        let err = insert_fact(&db, &fact("f2", "u1", "abc")).await.unwrap_err();
        assert!(err.is_duplicate_key(), "got {err:?}");
        assert_eq!(count_facts(&db, "u1").await.unwrap(), 1);

        let stored = get_fact_by_fingerprint(&db, "u1", "abc").await.unwrap().unwrap();
        assert_eq!(stored.id, "f1");
    }

    #[tokio::test]
    async fn same_fingerprint_for_different_users_is_allowed() {
        let db = Database::open_in_memory().await.unwrap();
        insert_fact(&db, &fact("f1", "u1", "abc")).await.unwrap();
        insert_fact(&db, &fact("f2", "u2", "abc")).await.unwrap();
        assert_eq!(count_facts(&db, "u1").await.unwrap(), 1);
        assert_eq!(count_facts(&db, "u2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_fingerprint_returns_none() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(get_fact_by_fingerprint(&db, "u1", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn source_links_are_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        insert_fact(&db, &fact("f1", "u1", "abc")).await.unwrap();

        link_source(&db, "f1", "m1").await.unwrap();
        link_source(&db, "f1", "m2").await.unwrap();
        link_source(&db, "f1", "m2").await.unwrap();

        assert_eq!(fact_sources(&db, "f1").await.unwrap(), vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn deleted_fact_frees_its_fingerprint() {
        let db = Database::open_in_memory().await.unwrap();
        insert_fact(&db, &fact("f1", "u1", "abc")).await.unwrap();
        link_source(&db, "f1", "m1").await.unwrap();

        delete_fact(&db, "f1").await.unwrap();
        assert_eq!(count_facts(&db, "u1").await.unwrap(), 0);
        assert!(fact_sources(&db, "f1").await.unwrap().is_empty());

        insert_fact(&db, &fact("f2", "u1", "abc")).await.unwrap();
        assert_eq!(count_facts(&db, "u1").await.unwrap(), 1);
    }
}
