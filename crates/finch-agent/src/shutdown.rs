// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shutdown coordination.
//!
//! SIGTERM and SIGINT cancel a [`CancellationToken`] the front end watches.
//! Before exiting, detached fact-extraction tasks get a bounded grace period.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::pipeline::ChatPipeline;

/// Install handlers for SIGTERM and SIGINT.
///
/// The returned token is cancelled when either signal arrives.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), shutting down"),
                        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, shutting down");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Wait up to `timeout` for the pipeline's background work.
///
/// Returns false when the deadline passed with tasks still running.
pub async fn drain_background(pipeline: &ChatPipeline, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, pipeline.wait_for_background()).await {
        Ok(()) => {
            debug!("background tasks drained");
            true
        }
        Err(_) => {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "background tasks still running at shutdown"
            );
            false
        }
    }
}
