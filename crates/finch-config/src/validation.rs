// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as a prompt budget larger than its answer reserve or a similarity floor
//! inside `[0, 1]`.

use crate::diagnostic::ConfigError;
use crate::model::FinchConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &FinchConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(validation("storage.database_path must not be empty"));
    }

    if config.agent.persona.trim().is_empty() {
        errors.push(validation("agent.persona must not be empty"));
    }

    if config.context.total_budget <= config.context.reserve {
        errors.push(validation(format!(
            "context.total_budget ({}) must be greater than context.reserve ({})",
            config.context.total_budget, config.context.reserve
        )));
    }

    if config.context.history_limit == 0 {
        errors.push(validation("context.history_limit must be at least 1"));
    }

    if config.memory.top_k == 0 {
        errors.push(validation("memory.top_k must be at least 1"));
    }

    let floor = config.memory.min_similarity;
    if !(0.0..=1.0).contains(&floor) {
        errors.push(validation(format!(
            "memory.min_similarity must be between 0.0 and 1.0, got {floor}"
        )));
    }

    if config.memory.max_embed_chars == 0 {
        errors.push(validation("memory.max_embed_chars must be at least 1"));
    }

    if config.summary.max_words == 0 {
        errors.push(validation("summary.max_words must be at least 1"));
    }

    if config.summary.recent_turns == 0 {
        errors.push(validation("summary.recent_turns must be at least 1"));
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(validation("rate_limit.max_requests must be at least 1"));
    }

    if config.rate_limit.window_secs == 0 {
        errors.push(validation("rate_limit.window_secs must be at least 1"));
    }

    if config.resilience.timeout_secs == 0 {
        errors.push(validation("resilience.timeout_secs must be at least 1"));
    }

    if config.resilience.max_attempts == 0 {
        errors.push(validation("resilience.max_attempts must be at least 1"));
    }

    if !(0.0..=2.0).contains(&config.openai.temperature) {
        errors.push(validation(format!(
            "openai.temperature must be between 0.0 and 2.0, got {}",
            config.openai.temperature
        )));
    }

    if !config.openai.base_url.starts_with("http://")
        && !config.openai.base_url.starts_with("https://")
    {
        errors.push(validation(format!(
            "openai.base_url `{}` must start with http:// or https://",
            config.openai.base_url
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = FinchConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = FinchConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn reserve_must_be_below_budget() {
        let mut config = FinchConfig::default();
        config.context.total_budget = 1000;
        config.context.reserve = 1000;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "total_budget"));
    }

    #[test]
    fn similarity_floor_out_of_range() {
        let mut config = FinchConfig::default();
        config.memory.min_similarity = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "min_similarity"));
    }

    #[test]
    fn zero_ceiling_and_window_are_both_reported() {
        let mut config = FinchConfig::default();
        config.rate_limit.max_requests = 0;
        config.rate_limit.window_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(has_error(&errors, "max_requests"));
        assert!(has_error(&errors, "window_secs"));
    }

    #[test]
    fn zero_attempts_fails_validation() {
        let mut config = FinchConfig::default();
        config.resilience.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "max_attempts"));
    }

    #[test]
    fn base_url_requires_scheme() {
        let mut config = FinchConfig::default();
        config.openai.base_url = "api.openai.com/v1".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "base_url"));
    }
}
