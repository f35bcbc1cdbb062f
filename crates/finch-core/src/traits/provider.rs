// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion capability trait.

use async_trait::async_trait;

use crate::error::FinchError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionRequest, CompletionResponse};

/// Adapter for a hosted completion model.
///
/// Implementations report transport and API failures as
/// [`FinchError::Provider`]; deadlines are applied by the caller.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: CompletionRequest)
    -> Result<CompletionResponse, FinchError>;
}
