//! Prometheus scrape endpoint bootstrap.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;
use thiserror::Error;

use crate::config::MetricsConfig;

/// Errors raised while installing the Prometheus exporter.
#[derive(Debug, Error)]
pub enum MetricsInitError {
    #[error("failed to install Prometheus exporter: {0}")]
    Exporter(#[from] metrics_exporter_prometheus::BuildError),
}

/// Install the global recorder and start the scrape listener.
///
/// Must run before the [`MetricRegistry`](crate::metrics::MetricRegistry)
/// is built so cached instruments bind to this recorder.
pub fn init_prometheus(config: &MetricsConfig) -> Result<(), MetricsInitError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.prometheus_port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(
        address = %addr,
        path = %config.prometheus_endpoint,
        "Prometheus metrics exporter started"
    );
    Ok(())
}
