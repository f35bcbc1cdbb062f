// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Finch memory pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Finch configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FinchConfig {
    /// Assistant identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// OpenAI-compatible completion and embedding API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Prompt budget settings.
    #[serde(default)]
    pub context: ContextConfig,

    /// Fact memory and recall settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Rolling conversation summary settings.
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Per-user request ceiling.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Timeout and retry policy for external capabilities.
    #[serde(default)]
    pub resilience: ResilienceConfig,
}

/// Assistant identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// System instructions prepended to every prompt.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Persona tag recorded on messages when the request names none.
    #[serde(default = "default_persona")]
    pub persona: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: default_system_prompt(),
            persona: default_persona(),
        }
    }
}

fn default_agent_name() -> String {
    "finch".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_system_prompt() -> String {
    "You are Finch, a careful personal finance assistant. Answer concisely and \
     never invent account data."
        .to_string()
}

fn default_persona() -> String {
    "prime".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("finch").join("finch.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("finch.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// OpenAI-compatible API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` requires the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the API (without trailing slash).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for chat replies and summaries.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for fact and query embeddings.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Maximum tokens generated per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature for chat replies.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_temperature() -> f32 {
    0.3
}

/// Prompt budget configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Total token budget for a prompt.
    #[serde(default = "default_total_budget")]
    pub total_budget: u32,

    /// Tokens held back for the model's answer.
    #[serde(default = "default_reserve")]
    pub reserve: u32,

    /// Most recent messages loaded from storage before budgeting.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Prefix applied to each recalled fact.
    #[serde(default = "default_recall_prefix")]
    pub recall_prefix: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            total_budget: default_total_budget(),
            reserve: default_reserve(),
            history_limit: default_history_limit(),
            recall_prefix: default_recall_prefix(),
        }
    }
}

fn default_total_budget() -> u32 {
    6000
}

fn default_reserve() -> u32 {
    1500
}

fn default_history_limit() -> u32 {
    50
}

fn default_recall_prefix() -> String {
    "Relevant memory: ".to_string()
}

/// Memory system configuration.
///
/// Controls fact extraction, embedding and similarity recall.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Enable the memory system. When false, no recall or extraction occurs.
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,

    /// Maximum recalled facts per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity for a recalled fact (0.0 disables the floor).
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,

    /// Characters of input sent to the embedding capability.
    #[serde(default = "default_max_embed_chars")]
    pub max_embed_chars: usize,

    /// Run fact extraction in a detached task after the reply is returned.
    #[serde(default)]
    pub background_extraction: bool,

    /// Mask card numbers, emails and phone numbers before persisting user text.
    #[serde(default = "default_mask_pii")]
    pub mask_pii: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_memory_enabled(),
            top_k: default_top_k(),
            min_similarity: default_min_similarity(),
            max_embed_chars: default_max_embed_chars(),
            background_extraction: false,
            mask_pii: default_mask_pii(),
        }
    }
}

fn default_memory_enabled() -> bool {
    true
}

fn default_top_k() -> usize {
    6
}

fn default_min_similarity() -> f32 {
    0.25
}

fn default_max_embed_chars() -> usize {
    2000
}

fn default_mask_pii() -> bool {
    true
}

/// Rolling summary configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryConfig {
    /// Roll the summary after every turn.
    #[serde(default = "default_summary_enabled")]
    pub enabled: bool,

    /// Word ceiling stated in the summarization instruction.
    #[serde(default = "default_max_words")]
    pub max_words: u32,

    /// Maximum tokens generated for a summary.
    #[serde(default = "default_summary_max_tokens")]
    pub max_tokens: u32,

    /// Latest messages fed to each rollup.
    #[serde(default = "default_recent_turns")]
    pub recent_turns: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: default_summary_enabled(),
            max_words: default_max_words(),
            max_tokens: default_summary_max_tokens(),
            recent_turns: default_recent_turns(),
        }
    }
}

fn default_summary_enabled() -> bool {
    true
}

fn default_max_words() -> u32 {
    150
}

fn default_summary_max_tokens() -> u32 {
    400
}

fn default_recent_turns() -> usize {
    6
}

/// Per-user fixed-window rate limit.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Gate chat turns through the limiter.
    #[serde(default = "default_rate_limit_enabled")]
    pub enabled: bool,

    /// Requests admitted per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_rate_limit_enabled(),
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_rate_limit_enabled() -> bool {
    true
}

fn default_max_requests() -> u32 {
    8
}

fn default_window_secs() -> u64 {
    60
}

/// Timeout and retry policy for completion and embedding calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResilienceConfig {
    /// Deadline for a single completion call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles afterwards.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound of the random jitter added to each delay.
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    25
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    300
}

fn default_max_jitter_ms() -> u64 {
    100
}
