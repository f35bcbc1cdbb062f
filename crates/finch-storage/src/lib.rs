// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Finch memory pipeline.
//!
//! WAL-mode SQLite with embedded migrations and a single-writer model via
//! `tokio-rusqlite`. Query modules cover the conversation log, deduplicated
//! facts and their source links, embedding vectors, rolling summaries and
//! rate-limit windows.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::{Database, map_sqlite_err, map_tr_err};
pub use models::*;
