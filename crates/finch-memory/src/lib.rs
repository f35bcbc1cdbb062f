// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory for the Finch memory pipeline.
//!
//! - **MemoryStore**: append-only message log, fingerprint-deduplicated facts,
//!   embedding upserts and cosine-similarity recall over SQLite BLOB vectors.
//! - **extract_facts**: heuristic extraction of vendors, amounts, dates,
//!   domains and masked contact details.
//! - **fingerprint**: fact normalization and SHA-256 content keys.

pub mod extractor;
pub mod fingerprint;
pub mod store;
pub mod types;

pub use extractor::extract_facts;
pub use fingerprint::{fingerprint, normalize, truncate_chars};
pub use store::MemoryStore;
pub use types::*;
