// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed statements for each table. Every mutation is a single statement.

pub mod embeddings;
pub mod facts;
pub mod messages;
pub mod rate_limits;
pub mod summaries;
