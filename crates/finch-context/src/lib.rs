// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly for the Finch pipeline.
//!
//! - [`ContextBuilder`] fits system instructions, recalled facts and as much
//!   recent history as the token budget allows.
//! - [`Summarizer`] keeps a short rolling summary per conversation so long
//!   conversations stay useful after old turns fall out of the budget.

pub mod builder;
pub mod summarizer;

pub use builder::{BuiltContext, ContextBuilder, cap_tokens, estimate_tokens};
pub use summarizer::Summarizer;
