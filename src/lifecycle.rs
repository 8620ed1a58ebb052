//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     config snapshot → Prometheus recorder → tracer provider
//!     → subscriber → registry/manager/logger → facade → collector task
//!
//! Shutdown:
//!     trigger() → collector stops → provider flush → provider shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: the metrics recorder installs before the registry so
//!   cached instruments bind to it; the provider builds before the
//!   subscriber so the bridge layer has a tracer
//! - A pillar that fails to initialize degrades to its no-op mode; startup
//!   itself never fails
//! - Shutdown has two stages: a broadcast for background tasks, then an
//!   explicit flush of the span pipeline

use std::sync::Arc;
use std::time::Duration;

use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::{HttpCaptureConfig, ObservabilityConfig};
use crate::facade::ObservabilityFacade;
use crate::http::HttpTraceLayer;
use crate::logging::{init_logging, CorrelatedLogger};
use crate::metrics::{init_prometheus, spawn_gauge_collector, MetricRegistry};
use crate::trace::{init_tracing, SpanManager};

/// Coordinator for graceful shutdown of background tasks.
///
/// Provides a broadcast channel that long-running tasks subscribe to.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle over the initialized pillars.
///
/// Owns the tracer provider and the background collector; dropping it
/// without calling [`shutdown`](Self::shutdown) stops the collector but
/// skips the final flush.
pub struct Observability {
    facade: Arc<ObservabilityFacade>,
    capture: HttpCaptureConfig,
    tracer_provider: Option<SdkTracerProvider>,
    shutdown: Shutdown,
    collector: Option<JoinHandle<()>>,
}

impl Observability {
    /// The composed facade, for handing to application code.
    pub fn facade(&self) -> Arc<ObservabilityFacade> {
        self.facade.clone()
    }

    /// A request-interception layer wired to this facade, carrying the
    /// configured payload-capture settings.
    pub fn http_layer(&self) -> HttpTraceLayer {
        HttpTraceLayer::new(self.facade()).with_capture(self.capture.clone())
    }

    /// Flush and stop everything: signal background tasks, flush the span
    /// pipeline, shut the provider down.
    pub async fn shutdown(mut self) {
        self.shutdown.trigger();
        if let Some(collector) = self.collector.take() {
            let _ = collector.await;
        }
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(error) = provider.force_flush() {
                tracing::warn!(error = %error, "span flush failed during shutdown");
            }
            if let Err(error) = provider.shutdown() {
                tracing::warn!(error = %error, "tracer provider shutdown failed");
            }
        }
    }
}

impl Drop for Observability {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Initialize every pillar from an immutable configuration snapshot.
///
/// Applied once at process start. Pillar initialization failures degrade
/// that pillar to no-op mode and are logged once the subscriber is up;
/// startup itself always succeeds.
pub fn init(config: ObservabilityConfig) -> Observability {
    let mut deferred: Vec<String> = Vec::new();

    // Metrics recorder first: instruments bind to the recorder installed
    // at creation time.
    let mut metrics_enabled = config.metrics.enabled;
    if metrics_enabled {
        if let Err(error) = init_prometheus(&config.metrics) {
            deferred.push(format!("metrics pillar disabled: {error}"));
            metrics_enabled = false;
        }
    }

    // Tracer provider before the subscriber so the bridge layer has a
    // tracer to hand spans to.
    let mut tracer_provider = None;
    if config.tracing.enabled {
        match init_tracing(&config) {
            Ok(provider) => tracer_provider = Some(provider),
            Err(error) => deferred.push(format!("tracing pillar disabled: {error}")),
        }
    }

    let bridge = tracer_provider
        .as_ref()
        .map(|provider| provider.tracer("observatory"));
    if let Err(error) = init_logging(&config, bridge) {
        // a subscriber installed by the host application is fine; records
        // still flow through it
        deferred.push(format!("subscriber installation skipped: {error}"));
    }

    for message in deferred {
        tracing::warn!("{message}");
    }

    let spans = Arc::new(match &tracer_provider {
        Some(_) => SpanManager::with_tracer(global::tracer("observatory")),
        None => SpanManager::disabled(),
    });
    let metrics = Arc::new(MetricRegistry::new(
        metrics_enabled,
        config.metrics.prefix.clone(),
    ));
    metrics.describe_http_instruments();
    let logger = Arc::new(CorrelatedLogger::new(&config));

    let facade = Arc::new(ObservabilityFacade::new(spans, metrics.clone(), logger));

    let shutdown = Shutdown::new();
    let collector = if metrics_enabled && tokio::runtime::Handle::try_current().is_ok() {
        Some(spawn_gauge_collector(
            metrics,
            Duration::from_millis(config.metrics.gauge_sample_interval_millis),
            &shutdown,
        ))
    } else {
        // without a runtime there is nothing to sample callbacks on
        None
    };

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        tracing_enabled = tracer_provider.is_some(),
        metrics_enabled,
        "observability initialized"
    );

    Observability {
        facade,
        capture: config.http.clone(),
        tracer_provider,
        shutdown,
        collector,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_with_everything_disabled_still_yields_a_working_facade() {
        let mut config = ObservabilityConfig::default();
        config.metrics.enabled = false;
        config.logging.enabled = false;
        // tracing disabled by default

        let observability = init(config);
        let facade = observability.facade();

        // all operations must be safe no-ops
        facade.record_event("started", &[], None);
        facade.record_gauge_metric("g", 1.0, &[]);
        facade
            .spans()
            .trace("op", |_span| Ok::<_, String>(()))
            .unwrap();

        observability.shutdown().await;
    }
}
