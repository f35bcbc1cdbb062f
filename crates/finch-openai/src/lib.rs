// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible completion and embedding adapter.
//!
//! [`OpenAiProvider`] implements both [`ProviderAdapter`] and
//! [`EmbeddingAdapter`] over one HTTP client. Any server speaking the
//! `/chat/completions` and `/embeddings` dialect works via `openai.base_url`.

pub mod client;
pub mod types;

use async_trait::async_trait;
use finch_config::model::OpenAiConfig;
use finch_core::{
    AdapterType, CompletionRequest, CompletionResponse, EmbeddingAdapter, EmbeddingInput,
    EmbeddingOutput, FinchError, HealthStatus, PluginAdapter, ProviderAdapter, TokenUsage,
};
use secrecy::SecretString;
use tracing::{debug, info};

pub use crate::client::OpenAiClient;
use crate::types::{ApiMessage, ChatCompletionRequest, EmbeddingRequest};

/// Completion and embedding adapter for an OpenAI-compatible API.
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiProvider {
    client: OpenAiClient,
    embedding_model: String,
}

impl OpenAiProvider {
    pub fn new(config: &OpenAiConfig) -> Result<Self, FinchError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = OpenAiClient::new(api_key, &config.base_url)?;
        info!(
            base_url = %client.base_url(),
            chat_model = %config.chat_model,
            embedding_model = %config.embedding_model,
            "OpenAI adapter initialized"
        );
        Ok(Self::with_client(client, &config.embedding_model))
    }

    /// Wrap an existing client.
    pub fn with_client(client: OpenAiClient, embedding_model: &str) -> Self {
        Self {
            client,
            embedding_model: embedding_model.to_string(),
        }
    }

    fn to_chat_request(request: &CompletionRequest) -> ChatCompletionRequest {
        let system = request.system_prompt.iter().map(|s| ApiMessage {
            role: "system".to_string(),
            content: s.clone(),
        });
        let messages = system
            .chain(request.messages.iter().map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            }))
            .collect();

        ChatCompletionRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

/// Resolve the API key from config, falling back to `OPENAI_API_KEY`.
pub fn resolve_api_key(config_key: &Option<String>) -> Result<SecretString, FinchError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(SecretString::from(key.clone()));
    }

    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| {
            FinchError::Config(
                "OpenAI API key not found. Set openai.api_key in config or the OPENAI_API_KEY \
                 environment variable."
                    .into(),
            )
        })
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, FinchError> {
        // No probe call; it would spend tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FinchError> {
        debug!("OpenAI adapter shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, FinchError> {
        let body = Self::to_chat_request(&request);
        let response = self.client.chat_completion(&body).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let usage = response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        debug!(
            model = %request.model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "completion received"
        );

        Ok(CompletionResponse {
            id: response.id,
            content,
            model: if response.model.is_empty() {
                request.model
            } else {
                response.model
            },
            usage,
        })
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiProvider {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, FinchError> {
        let expected = input.texts.len();
        let body = EmbeddingRequest {
            model: self.embedding_model.clone(),
            input: input.texts,
        };
        let mut response = self.client.embeddings(&body).await?;

        if response.data.len() != expected {
            return Err(FinchError::provider(format!(
                "embedding count mismatch: sent {expected}, received {}",
                response.data.len()
            )));
        }
        response.data.sort_by_key(|d| d.index);

        let embeddings: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();
        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}
