// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Finch integration tests.
//!
//! Mock capabilities and a pipeline harness for fast, deterministic tests
//! with no network access.
//!
//! # Components
//!
//! - [`MockProvider`] - scripted completion replies and failures
//! - [`MockEmbedder`] - deterministic bag-of-words embeddings
//! - [`MockObserver`] - in-memory metric event capture
//! - [`TestHarness`] - a full [`ChatPipeline`](finch_agent::ChatPipeline) over a temp database

pub mod harness;
pub mod mock_embedder;
pub mod mock_observer;
pub mod mock_provider;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_embedder::MockEmbedder;
pub use mock_observer::MockObserver;
pub use mock_provider::MockProvider;
