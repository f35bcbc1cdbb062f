// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for calls to external capabilities.
//!
//! - [`with_timeout`] bounds a single call and maps expiry to [`FinchError::Timeout`].
//! - [`retry_with_backoff`] re-runs retryable failures with doubling delays
//!   plus uniform jitter.
//!
//! [`FinchError::Timeout`]: finch_core::FinchError::Timeout

pub mod retry;
pub mod timeout;

pub use retry::{RetryPolicy, retry_with_backoff};
pub use timeout::with_timeout;
