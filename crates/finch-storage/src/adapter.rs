// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter lifecycle.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use finch_config::model::StorageConfig;
use finch_core::{AdapterType, FinchError, HealthStatus, PluginAdapter, StorageAdapter};

use crate::database::{Database, map_tr_err};

/// SQLite-backed storage adapter.
///
/// The database is opened lazily by [`StorageAdapter::initialize`]; afterwards
/// [`SqliteStorage::database`] hands out handles that share its writer thread.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// A handle to the opened database.
    pub fn database(&self) -> Result<Database, FinchError> {
        self.db().cloned()
    }

    fn db(&self) -> Result<&Database, FinchError> {
        self.db.get().ok_or_else(|| FinchError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Fold the WAL back into the main file. Rollback-journal databases have
    /// nothing to fold.
    async fn checkpoint(&self, db: &Database) -> Result<(), FinchError> {
        if !self.config.wal_mode {
            return Ok(());
        }
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, FinchError> {
        let db = self.db()?;
        let result = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err);
        Ok(match result {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), FinchError> {
        if let Some(db) = self.db.get() {
            self.checkpoint(db).await?;
            debug!("storage shut down");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), FinchError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| FinchError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), FinchError> {
        self.checkpoint(self.db()?).await?;
        debug!(path = %self.config.database_path, "storage closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::summaries;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists());
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn database_is_unavailable_before_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.database().is_err());
        assert!(storage.health_check().await.is_err());
    }

    #[tokio::test]
    async fn handles_share_data_and_close_cleanly() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);

        let db = storage.database().unwrap();
        summaries::upsert_summary(&db, "u1", "c1", "pays rent monthly", "2026-01-01T00:00:00.000Z")
            .await
            .unwrap();

        let other = storage.database().unwrap();
        assert_eq!(
            summaries::get_summary(&other, "u1", "c1").await.unwrap().as_deref(),
            Some("pays rent monthly")
        );

        storage.close().await.unwrap();
        storage.shutdown().await.unwrap();
    }
}
