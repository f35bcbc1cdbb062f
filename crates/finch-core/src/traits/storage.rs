// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends.

use async_trait::async_trait;

use crate::error::FinchError;
use crate::traits::adapter::PluginAdapter;

/// Lifecycle of a persistence backend.
///
/// Data access goes through typed query modules in `finch-storage`; this
/// trait only covers opening and closing the backend.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, PRAGMAs).
    async fn initialize(&self) -> Result<(), FinchError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), FinchError>;
}
