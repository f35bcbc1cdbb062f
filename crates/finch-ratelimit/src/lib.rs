// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user request ceiling for chat turns.
//!
//! Requests are counted in fixed windows (one minute by default) stored in
//! SQLite. A warning is logged at 80% of the ceiling and
//! [`FinchError::RateLimited`](finch_core::FinchError::RateLimited) is
//! returned once it is exceeded.

pub mod clock;
pub mod limiter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use limiter::{Admission, RateLimiter};
