// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observability adapter trait for metrics and telemetry.

use async_trait::async_trait;

use crate::error::FinchError;
use crate::traits::adapter::PluginAdapter;
use crate::types::MetricEvent;

/// Adapter for recording metric events.
///
/// Callers on the request path must not await this directly; they go
/// through a best-effort sink so a failing recorder never fails a request.
#[async_trait]
pub trait ObservabilityAdapter: PluginAdapter {
    /// Records a metric or telemetry event.
    async fn record(&self, event: MetricEvent) -> Result<(), FinchError>;
}
