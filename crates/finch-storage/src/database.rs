// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! Every statement runs on tokio-rusqlite's single background thread, so the
//! [`Database`] handle is the only writer. Clones share that thread.

use finch_core::FinchError;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::migrations;

/// Handle to the SQLite database. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file at `path` in WAL mode and run migrations.
    pub async fn open(path: &str) -> Result<Self, FinchError> {
        Self::open_with(path, true).await
    }

    /// Open the database at `path`, choosing the journal mode.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, FinchError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(FinchError::storage)?;
        }

        let conn = Connection::open(path).await.map_err(map_sqlite_err)?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        info!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database with the full schema applied.
    pub async fn open_in_memory() -> Result<Self, FinchError> {
        let conn = Connection::open_in_memory().await.map_err(map_sqlite_err)?;
        let db = Self { conn };
        db.prepare(false).await?;
        debug!("in-memory database opened");
        Ok(db)
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), FinchError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), FinchError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                }
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.pragma_update(None, "busy_timeout", 5000)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.conn
            .call(|conn| Ok(migrations::run_migrations(conn)))
            .await
            .map_err(map_tr_err)?
    }
}

/// Convert a tokio-rusqlite error into a [`FinchError`].
///
/// Uniqueness and primary-key violations are classified as
/// [`FinchError::DuplicateKey`] from SQLite's extended result codes; everything
/// else becomes [`FinchError::Storage`].
pub fn map_tr_err(err: tokio_rusqlite::Error<rusqlite::Error>) -> FinchError {
    match err {
        tokio_rusqlite::Error::Error(inner) => map_sqlite_err(inner),
        other => FinchError::storage(other),
    }
}

/// Classify a raw rusqlite error.
pub fn map_sqlite_err(err: rusqlite::Error) -> FinchError {
    if let rusqlite::Error::SqliteFailure(code, ref message) = err
        && is_duplicate_code(code.extended_code)
    {
        let constraint = message
            .as_deref()
            .and_then(|m| m.strip_prefix("UNIQUE constraint failed: "))
            .unwrap_or("unique")
            .to_string();
        return FinchError::DuplicateKey { constraint };
    }
    FinchError::storage(err)
}

fn is_duplicate_code(extended_code: i32) -> bool {
    extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
}
