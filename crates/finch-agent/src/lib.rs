// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat turn orchestration for Finch.
//!
//! [`ChatPipeline`] runs a single turn: rate limit, recall, summary, prompt
//! budgeting, completion, persistence, fact extraction and summary rollup.
//! Front ends (the CLI, a shell, an HTTP layer) build a [`ChatRequest`] and
//! render the [`ChatResponse`] or [`FinchError`](finch_core::FinchError).

pub mod pipeline;
pub mod request;
pub mod shutdown;

pub use pipeline::ChatPipeline;
pub use request::{ChatRequest, ChatResponse, MAX_MESSAGE_CHARS};
pub use shutdown::{drain_background, install_signal_handler};
