// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types and vector helpers.

use serde::{Deserialize, Serialize};

/// Result of [`MemoryStore::save_fact`](crate::MemoryStore::save_fact).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactOutcome {
    /// A new fact row was written and embedded.
    Stored { fact_id: String },
    /// The normalized text was already stored for this user. Nothing was embedded.
    Duplicate { fact_id: String },
}

impl FactOutcome {
    pub fn fact_id(&self) -> &str {
        match self {
            FactOutcome::Stored { fact_id } | FactOutcome::Duplicate { fact_id } => fact_id,
        }
    }

    /// Label used for the `outcome` metric dimension.
    pub fn label(&self) -> &'static str {
        match self {
            FactOutcome::Stored { .. } => "stored",
            FactOutcome::Duplicate { .. } => "duplicate",
        }
    }
}

/// One similarity-search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecalledMemory {
    pub source_message_id: String,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
    pub text: String,
}

/// What kind of detail a heuristic extraction found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactKind {
    Vendor,
    Amount,
    Date,
    Domain,
    Email,
    Phone,
}

impl FactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactKind::Vendor => "vendor",
            FactKind::Amount => "amount",
            FactKind::Date => "date",
            FactKind::Domain => "domain",
            FactKind::Email => "email",
            FactKind::Phone => "phone",
        }
    }

    /// Broad grouping recorded alongside the value.
    pub fn scope(&self) -> &'static str {
        match self {
            FactKind::Vendor | FactKind::Amount | FactKind::Date => "transaction",
            FactKind::Domain => "network",
            FactKind::Email | FactKind::Phone => "contact",
        }
    }
}

/// A detail pulled out of message text by [`extract_facts`](crate::extract_facts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFact {
    pub kind: FactKind,
    pub value: String,
    pub scope: String,
}

impl ExtractedFact {
    pub fn new(kind: FactKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            scope: kind.scope().to_string(),
        }
    }

    /// `kind: value`, the form persisted as fact text.
    pub fn render(&self) -> String {
        format!("{}: {}", self.kind.as_str(), self.value)
    }
}

/// Encode a vector as little-endian f32 bytes for BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decode a BLOB written by [`vec_to_blob`]. Trailing partial chunks are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity of two vectors.
///
/// Returns 0.0 for mismatched lengths or a zero-length vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
