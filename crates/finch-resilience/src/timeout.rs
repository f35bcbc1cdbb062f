// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::future::Future;
use std::time::Duration;

use finch_core::FinchError;

/// Run `operation`, failing with [`FinchError::Timeout`] once `duration` elapses.
///
/// The inner future is dropped on expiry.
pub async fn with_timeout<F, T>(
    duration: Duration,
    operation_name: &str,
    operation: F,
) -> Result<T, FinchError>
where
    F: Future<Output = Result<T, FinchError>>,
{
    match tokio::time::timeout(duration, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation = operation_name, ?duration, "operation timed out");
            Err(FinchError::Timeout { duration })
        }
    }
}
