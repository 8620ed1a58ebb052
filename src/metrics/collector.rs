//! Periodic sampling of observable-gauge callbacks.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::lifecycle::Shutdown;
use crate::metrics::registry::MetricRegistry;

/// Spawn the background task that evaluates registered gauge callbacks on
/// a fixed interval until shutdown is triggered.
pub fn spawn_gauge_collector(
    registry: Arc<MetricRegistry>,
    interval: Duration,
    shutdown: &Shutdown,
) -> JoinHandle<()> {
    let mut rx = shutdown.subscribe();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(interval);
        // the first tick fires immediately; skip it so samples are spaced
        tick.tick().await;
        loop {
            tokio::select! {
                _ = tick.tick() => registry.sample_observable_gauges(),
                _ = rx.recv() => break,
            }
        }
        tracing::debug!("gauge collector stopped");
    })
}
