// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observability adapter that keeps every event in memory.

use std::sync::Mutex;

use async_trait::async_trait;

use finch_core::{
    AdapterType, FinchError, HealthStatus, MetricEvent, ObservabilityAdapter, PluginAdapter,
};

/// Records [`MetricEvent`]s for later assertions.
#[derive(Default)]
pub struct MockObserver {
    events: Mutex<Vec<MetricEvent>>,
}

impl MockObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MetricEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Sum of counter increments recorded under `name`.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.events()
            .iter()
            .filter_map(|e| match e {
                MetricEvent::Counter { name: n, value, .. } if n == name => Some(*value),
                _ => None,
            })
            .sum()
    }

    /// Label sets of every event recorded under `name`, in arrival order.
    pub fn labels_for(&self, name: &str) -> Vec<Vec<(String, String)>> {
        self.events()
            .into_iter()
            .filter(|e| e.name() == name)
            .map(|e| match e {
                MetricEvent::Counter { labels, .. }
                | MetricEvent::Gauge { labels, .. }
                | MetricEvent::Histogram { labels, .. } => labels,
            })
            .collect()
    }
}

#[async_trait]
impl PluginAdapter for MockObserver {
    fn name(&self) -> &str {
        "mock-observer"
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
impl ObservabilityAdapter for MockObserver {
    async fn record(&self, event: MetricEvent) -> Result<(), FinchError> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counters_are_summed_by_name() {
        let observer = MockObserver::new();
        observer
            .record(MetricEvent::count("turns", &[("persona", "prime")]))
            .await
            .unwrap();
        observer.record(MetricEvent::count("turns", &[])).await.unwrap();
        observer
            .record(MetricEvent::observe("latency", 0.2, &[]))
            .await
            .unwrap();

        assert_eq!(observer.counter_total("turns"), 2);
        assert_eq!(observer.counter_total("latency"), 0);
        assert_eq!(
            observer.labels_for("turns")[0],
            vec![("persona".to_string(), "prime".to_string())]
        );
    }
}
