// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user fixed-window request ceiling.
//!
//! Every check is a single atomic upsert against `rate_limit_windows`, so
//! concurrent requests for one user never lose an increment. Storage failures
//! reject the request rather than admitting it.

use std::sync::Arc;
use std::time::Duration;

use finch_config::model::RateLimitConfig;
use finch_core::FinchError;
use finch_storage::Database;
use finch_storage::queries::rate_limits;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};

/// A request that was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Requests counted in the current window, this one included.
    pub count: u32,
    /// Requests still admitted in the current window.
    pub remaining: u32,
    /// Unix seconds at which the current window began.
    pub window_start: i64,
}

/// Fixed-window limiter backed by SQLite.
pub struct RateLimiter {
    db: Database,
    clock: Arc<dyn Clock>,
    max_requests: u32,
    window_secs: u64,
}

impl RateLimiter {
    pub fn new(db: Database, config: &RateLimitConfig) -> Self {
        Self {
            db,
            clock: Arc::new(SystemClock),
            max_requests: config.max_requests,
            window_secs: config.window_secs.max(1),
        }
    }

    /// Replace the clock used to place requests in windows.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn window_millis(&self) -> i64 {
        i64::try_from(self.window_secs)
            .unwrap_or(i64::MAX / 1000)
            .saturating_mul(1000)
    }

    /// Start of the window containing `now_millis`, in Unix seconds.
    fn window_start(&self, now_millis: i64) -> i64 {
        now_millis.div_euclid(self.window_millis()) * self.window_millis() / 1000
    }

    /// Time left until the window containing `now_millis` ends, at least one second.
    fn retry_after(&self, now_millis: i64) -> Duration {
        let into_window = now_millis.rem_euclid(self.window_millis());
        let left = u64::try_from(self.window_millis() - into_window).unwrap_or(0);
        Duration::from_millis(left).max(Duration::from_secs(1))
    }

    /// Count one request for `user_id` and decide whether it is admitted.
    ///
    /// Returns [`FinchError::RateLimited`] once the window's count exceeds the
    /// ceiling. The counter still advances for rejected requests.
    pub async fn check(&self, user_id: &str) -> Result<Admission, FinchError> {
        let now = self.clock.now_millis();
        let window_start = self.window_start(now);

        let count = rate_limits::increment_window(&self.db, user_id, window_start).await?;
        debug!(user_id, window_start, count, "rate limit window incremented");

        if count > self.max_requests {
            let retry_after = self.retry_after(now);
            info!(
                user_id,
                count,
                max_requests = self.max_requests,
                retry_after_ms = retry_after.as_millis() as u64,
                "rate limit exceeded"
            );
            return Err(FinchError::RateLimited { retry_after });
        }

        if u64::from(count) * 5 >= u64::from(self.max_requests) * 4 {
            warn!(
                user_id,
                count,
                max_requests = self.max_requests,
                "approaching rate limit (80%+)"
            );
        }

        Ok(Admission {
            count,
            remaining: self.max_requests - count,
            window_start,
        })
    }

    /// Delete every window older than the current one. Returns rows removed.
    pub async fn prune(&self) -> Result<usize, FinchError> {
        let current = self.window_start(self.clock.now_millis());
        let removed = rate_limits::prune_before(&self.db, current).await?;
        if removed > 0 {
            debug!(removed, "pruned stale rate limit windows");
        }
        Ok(removed)
    }
}
