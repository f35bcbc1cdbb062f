// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric names and descriptions.
//!
//! Uses the metrics-rs facade so any recorder can collect these.

use metrics::{describe_counter, describe_histogram};

pub const CHAT_TURNS_TOTAL: &str = "finch_chat_turns_total";
pub const RATE_LIMITED_TOTAL: &str = "finch_rate_limited_total";
pub const FACTS_TOTAL: &str = "finch_facts_total";
pub const CONTEXT_OVER_LIMIT_TOTAL: &str = "finch_context_over_limit_total";
pub const COMPLETION_LATENCY_SECONDS: &str = "finch_completion_latency_seconds";

/// Register all Finch metric descriptions with the current recorder.
pub fn register_metrics() {
    describe_counter!(CHAT_TURNS_TOTAL, "Chat turns answered");
    describe_counter!(RATE_LIMITED_TOTAL, "Chat turns rejected by the rate limiter");
    describe_counter!(FACTS_TOTAL, "Facts saved, labelled by outcome");
    describe_counter!(
        CONTEXT_OVER_LIMIT_TOTAL,
        "Prompts that dropped history to fit the token budget"
    );
    describe_histogram!(
        COMPLETION_LATENCY_SECONDS,
        "Completion call latency in seconds"
    );
}
