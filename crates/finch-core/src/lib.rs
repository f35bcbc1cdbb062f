// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Finch memory pipeline.
//!
//! This crate provides the trait definitions, error type, and shared chat
//! types used throughout the Finch workspace. The completion, embedding,
//! storage and metrics capabilities are all reached through traits defined
//! here, so every pipeline stage can be built against test doubles.

pub mod error;
pub mod traits;
pub mod types;

pub use error::FinchError;
pub use types::{
    AdapterType, ChatMessage, CompletionRequest, CompletionResponse, EmbeddingInput,
    EmbeddingOutput, HealthStatus, MessageId, MetricEvent, Role, TokenUsage,
};

pub use traits::{
    EmbeddingAdapter, ObservabilityAdapter, PluginAdapter, ProviderAdapter, StorageAdapter,
};
