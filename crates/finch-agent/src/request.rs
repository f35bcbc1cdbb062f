// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed chat request and response with boundary validation.

use finch_core::FinchError;
use serde::{Deserialize, Serialize};

/// Longest accepted message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 8000;

/// One inbound chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatRequest {
    pub user_id: String,
    pub conversation_id: String,
    pub message: String,
    /// Persona answering the turn. Falls back to `agent.persona`.
    #[serde(default)]
    pub persona_id: Option<String>,
}

impl ChatRequest {
    pub fn new(
        user_id: impl Into<String>,
        conversation_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            conversation_id: conversation_id.into(),
            message: message.into(),
            persona_id: None,
        }
    }

    pub fn with_persona(mut self, persona_id: impl Into<String>) -> Self {
        self.persona_id = Some(persona_id.into());
        self
    }

    /// Reject requests with blank identifiers, a blank message, or a message
    /// longer than [`MAX_MESSAGE_CHARS`].
    pub fn validate(&self) -> Result<(), FinchError> {
        if self.user_id.trim().is_empty() {
            return Err(FinchError::Validation("user_id is required".into()));
        }
        if self.conversation_id.trim().is_empty() {
            return Err(FinchError::Validation("conversation_id is required".into()));
        }
        if self.message.trim().is_empty() {
            return Err(FinchError::Validation("message is required".into()));
        }
        let chars = self.message.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(FinchError::Validation(format!(
                "message is {chars} characters; the limit is {MAX_MESSAGE_CHARS}"
            )));
        }
        if let Some(persona) = &self.persona_id
            && persona.trim().is_empty()
        {
            return Err(FinchError::Validation("persona_id must not be blank".into()));
        }
        Ok(())
    }
}

/// The answer to a [`ChatRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    /// True when older history was left out of the prompt.
    pub over_limit: bool,
    /// True when the rolling summary was rewritten this turn.
    pub summary_updated: bool,
    pub persona_id: String,
}
