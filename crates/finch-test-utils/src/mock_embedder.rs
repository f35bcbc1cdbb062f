// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic embedding adapter.
//!
//! Each lowercase alphanumeric token is hashed (FNV-1a) into one of
//! [`DIMENSIONS`] buckets, so texts sharing words have positive cosine
//! similarity and texts sharing none score zero.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use finch_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, FinchError, HealthStatus,
    PluginAdapter,
};

/// Vector width produced by [`MockEmbedder`].
pub const DIMENSIONS: usize = 256;

/// Bag-of-words embedder with a call counter and scripted failures.
pub struct MockEmbedder {
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
    failures: Mutex<VecDeque<FinchError>>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
        }
    }

    /// Number of `embed` calls, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every text passed to `embed`, in order.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().map(|i| i.clone()).unwrap_or_default()
    }

    /// Make the next call fail with `error`. Queued failures are used in order.
    pub fn fail_next(&self, error: FinchError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(error);
        }
    }

    /// The vector this embedder produces for `text`.
    pub fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(&token.to_lowercase()) % DIMENSIONS as u64) as usize;
            vector[bucket] += 1.0;
        }
        vector
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

/// FNV-1a, with the high half folded into the low bits before bucketing.
fn fnv1a(token: &str) -> u64 {
    let hash = token.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    });
    hash ^ (hash >> 32)
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, FinchError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FinchError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, FinchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.extend(input.texts.iter().cloned());
        }

        let failure = self.failures.lock().ok().and_then(|mut f| f.pop_front());
        if let Some(error) = failure {
            return Err(error);
        }

        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| Self::vector_for(t)).collect(),
            dimensions: DIMENSIONS,
        })
    }
}
