// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the persisted entities.

use serde::{Deserialize, Serialize};

/// A row of the append-only `messages` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub user_id: String,
    pub conversation_id: String,
    /// `user`, `assistant` or `system`.
    pub role: String,
    pub content: String,
    pub persona_id: Option<String>,
    /// RFC 3339 UTC with millisecond precision.
    pub created_at: String,
}

/// A deduplicated fact. `(user_id, fingerprint)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactRow {
    pub id: String,
    pub user_id: String,
    pub fact: String,
    pub source_message_id: String,
    pub fingerprint: String,
    pub created_at: String,
}

/// A stored vector keyed by `(user_id, source_message_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRow {
    pub user_id: String,
    pub source_message_id: String,
    /// Little-endian f32 bytes.
    pub embedding: Vec<u8>,
    pub text: String,
    pub updated_at: String,
}

/// Current RFC 3339 timestamp with millisecond precision, as stored in every table.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
