// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fact normalization and content fingerprints.

use sha2::{Digest, Sha256};

/// Canonical form of a fact: surrounding whitespace removed, lowercased.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Hex SHA-256 of the normalized text. Equal for case and padding variants.
pub fn fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(normalize(text).as_bytes()))
}

/// The first `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
