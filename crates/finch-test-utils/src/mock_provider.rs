// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion provider for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with scripted replies and
//! failures, and records every request it receives.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use finch_core::{
    AdapterType, CompletionRequest, CompletionResponse, FinchError, HealthStatus, PluginAdapter,
    ProviderAdapter, TokenUsage,
};

/// A completion provider that replays a FIFO script.
///
/// When the script is exhausted, `"mock response"` is returned.
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<Result<String, FinchError>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    delay: Option<Duration>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Create a mock provider pre-loaded with the given replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let provider = Self::new();
        if let Ok(mut script) = provider.script.try_lock() {
            script.extend(responses.into_iter().map(Ok));
        }
        provider
    }

    /// Sleep this long before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn add_response(&self, text: impl Into<String>) {
        self.script.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a failure; it is returned in FIFO order with the replies.
    pub async fn add_failure(&self, error: FinchError) {
        self.script.lock().await.push_back(Err(error));
    }

    /// Every request received so far, in order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, FinchError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FinchError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, FinchError> {
        let model = request.model.clone();
        self.requests.lock().await.push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("mock response".to_string()));

        next.map(|content| CompletionResponse {
            id: format!("mock-resp-{}", uuid::Uuid::new_v4()),
            content,
            model,
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 20,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finch_core::ChatMessage;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest {
            model: "test-model".to_string(),
            system_prompt: None,
            messages: vec![ChatMessage::user(text)],
            temperature: Some(0.0),
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn default_response_when_script_empty() {
        let provider = MockProvider::new();
        let resp = provider.complete(request("hi")).await.unwrap();
        assert_eq!(resp.content, "mock response");
        assert_eq!(resp.model, "test-model");
    }

    #[tokio::test]
    async fn replies_and_failures_follow_script_order() {
        let provider = MockProvider::with_responses(vec!["first".to_string()]);
        provider.add_failure(FinchError::provider("503")).await;
        provider.add_response("third").await;

        assert_eq!(provider.complete(request("a")).await.unwrap().content, "first");
        assert!(provider.complete(request("b")).await.is_err());
        assert_eq!(provider.complete(request("c")).await.unwrap().content, "third");
    }

    #[tokio::test]
    async fn requests_are_recorded() {
        let provider = MockProvider::new();
        provider.complete(request("remember me")).await.unwrap();
        let seen = provider.requests().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].messages[0].content, "remember me");
        assert_eq!(provider.call_count().await, 1);
    }
}
