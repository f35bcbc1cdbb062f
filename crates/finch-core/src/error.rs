// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Finch memory pipeline.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Finch adapter traits and pipeline stages.
#[derive(Debug, Error)]
pub enum FinchError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller exceeded the per-window request ceiling.
    #[error("rate limited: retry after {}s", wait_secs(.retry_after))]
    RateLimited { retry_after: Duration },

    /// A uniqueness constraint rejected an insert.
    ///
    /// Classified from the storage engine's constraint codes, so callers can
    /// branch on it without inspecting message text.
    #[error("duplicate key violates {constraint}")]
    DuplicateKey { constraint: String },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Completion or embedding capability errors (API failure, malformed reply).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// A request failed boundary validation.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FinchError {
    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FinchError::Storage {
            source: Box::new(err),
        }
    }

    /// Builds a provider failure without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        FinchError::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// True for failures of an external capability, including timeouts.
    pub fn is_capability_failure(&self) -> bool {
        matches!(self, FinchError::Provider { .. } | FinchError::Timeout { .. })
    }

    /// True when retrying the same call may succeed.
    ///
    /// Rate limiting, storage and validation failures are never retried.
    pub fn is_retryable(&self) -> bool {
        self.is_capability_failure()
    }

    /// True for the structured duplicate-key classification.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, FinchError::DuplicateKey { .. })
    }

    /// Text safe to show an end user. Carries no internal detail.
    pub fn user_message(&self) -> String {
        match self {
            FinchError::RateLimited { retry_after } => format!(
                "You're sending messages too quickly. Please wait {}s and try again.",
                wait_secs(retry_after)
            ),
            FinchError::Validation(reason) => format!("Invalid request: {reason}"),
            FinchError::Provider { .. } | FinchError::Timeout { .. } => {
                "The assistant is temporarily unavailable. Please try again shortly.".to_string()
            }
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Whole seconds to wait, rounded up so a client never returns early.
fn wait_secs(retry_after: &Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}
