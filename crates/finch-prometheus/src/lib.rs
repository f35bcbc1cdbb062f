// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics for the Finch pipeline.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. The pipeline
//! never records directly; it emits [`MetricEvent`]s into a [`MetricsSink`],
//! which forwards them to an [`ObservabilityAdapter`] such as
//! [`PrometheusAdapter`] off the request path.

pub mod recording;
pub mod sink;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

use finch_core::{
    AdapterType, FinchError, HealthStatus, MetricEvent, ObservabilityAdapter, PluginAdapter,
};

pub use recording::register_metrics;
pub use sink::MetricsSink;

/// Prometheus metrics adapter.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
    /// Set when the recorder is scoped to this adapter rather than installed globally.
    local: Option<PrometheusRecorder>,
}

impl PrometheusAdapter {
    /// Install the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process.
    pub fn install() -> Result<Self, FinchError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            FinchError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;
        register_metrics();
        tracing::info!("prometheus metrics recorder installed");
        Ok(Self {
            handle,
            local: None,
        })
    }

    /// A recorder owned by this adapter alone. Nothing is installed globally.
    pub fn local() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, register_metrics);
        Self {
            handle,
            local: Some(recorder),
        }
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    fn apply(event: MetricEvent) {
        match event {
            MetricEvent::Counter {
                name,
                value,
                labels,
            } => metrics::counter!(name, to_labels(labels)).increment(value),
            MetricEvent::Gauge {
                name,
                value,
                labels,
            } => metrics::gauge!(name, to_labels(labels)).set(value),
            MetricEvent::Histogram {
                name,
                value,
                labels,
            } => metrics::histogram!(name, to_labels(labels)).record(value),
        }
    }
}

fn to_labels(labels: Vec<(String, String)>) -> Vec<metrics::Label> {
    labels
        .into_iter()
        .map(|(k, v)| metrics::Label::new(k, v))
        .collect()
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, FinchError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FinchError> {
        Ok(())
    }
}

#[async_trait]
impl ObservabilityAdapter for PrometheusAdapter {
    async fn record(&self, event: MetricEvent) -> Result<(), FinchError> {
        match &self.local {
            Some(recorder) => metrics::with_local_recorder(recorder, || Self::apply(event)),
            None => Self::apply(event),
        }
        Ok(())
    }
}
