// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort metric dispatch.
//!
//! [`MetricsSink::emit`] never blocks and never fails: events go into a
//! bounded channel drained by a background task, and are dropped when the
//! channel is full or closed. Recorder errors are logged and swallowed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use finch_core::{MetricEvent, ObservabilityAdapter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Non-blocking handle for recording metric events.
#[derive(Clone, Default)]
pub struct MetricsSink {
    tx: Option<mpsc::Sender<MetricEvent>>,
    dropped: Arc<AtomicU64>,
}

impl MetricsSink {
    /// Start a drain task forwarding events to `adapter`.
    ///
    /// The task ends once every sink clone has been dropped.
    pub fn spawn(
        adapter: Arc<dyn ObservabilityAdapter>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<MetricEvent>(capacity.max(1));
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = adapter.record(event).await {
                    debug!(error = %e, "metric recorder failed, event dropped");
                }
            }
        });
        let sink = Self {
            tx: Some(tx),
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (sink, handle)
    }

    /// A sink that discards everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Queue `event` without waiting. Drops it if the channel is full or closed.
    pub fn emit(&self, event: MetricEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        if let Err(e) = tx.try_send(event) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(error = %e, "metric event dropped");
        }
    }

    /// Events queued but not yet taken by the drain task.
    pub fn pending(&self) -> usize {
        self.tx
            .as_ref()
            .map(|tx| tx.max_capacity() - tx.capacity())
            .unwrap_or(0)
    }

    /// Events dropped because the channel was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use finch_core::{AdapterType, FinchError, HealthStatus, PluginAdapter};
    use tokio::sync::{Mutex, Notify};

    #[derive(Default)]
    struct Collect {
        events: Mutex<Vec<MetricEvent>>,
        gate: Option<Arc<Notify>>,
        fail: bool,
    }

    #[async_trait]
    impl PluginAdapter for Collect {
        fn name(&self) -> &str {
            "collect"
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
    impl ObservabilityAdapter for Collect {
        async fn record(&self, event: MetricEvent) -> Result<(), FinchError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(FinchError::Internal("recorder down".into()));
            }
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    #[tokio::test]
    async fn events_reach_the_adapter() {
        let adapter = Arc::new(Collect::default());
        let (sink, handle) = MetricsSink::spawn(adapter.clone(), 8);
        sink.emit(MetricEvent::count("a", &[]));
        sink.emit(MetricEvent::observe("b", 0.5, &[]));
        drop(sink);
        handle.await.unwrap();

        let events = adapter.events.lock().await;
        let names: Vec<_> = events.iter().map(MetricEvent::name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_blocking() {
        let gate = Arc::new(Notify::new());
        let adapter = Arc::new(Collect {
            gate: Some(gate.clone()),
            ..Collect::default()
        });
        let (sink, _handle) = MetricsSink::spawn(adapter, 1);
        for _ in 0..10 {
            sink.emit(MetricEvent::count("burst", &[]));
        }
        // At most one event is buffered and one held by the blocked drain task.
        assert!(sink.dropped() >= 8, "dropped {}", sink.dropped());
    }

    #[tokio::test]
    async fn failing_recorder_is_swallowed() {
        let adapter = Arc::new(Collect {
            fail: true,
            ..Collect::default()
        });
        let (sink, handle) = MetricsSink::spawn(adapter, 4);
        sink.emit(MetricEvent::count("x", &[]));
        drop(sink);
        handle.await.unwrap();
    }

    #[test]
    fn disabled_sink_ignores_events() {
        let sink = MetricsSink::disabled();
        sink.emit(MetricEvent::count("x", &[]));
        assert_eq!(sink.dropped(), 0);
    }
}
