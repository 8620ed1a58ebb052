//! Shared utilities for integration testing.

use std::future::Future;
use std::sync::Arc;

use metrics::{SharedString, Unit};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use metrics_util::CompositeKey;
use opentelemetry::global::BoxedTracer;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};

use observatory::config::ObservabilityConfig;
use observatory::facade::ObservabilityFacade;
use observatory::logging::CorrelatedLogger;
use observatory::metrics::MetricRegistry;
use observatory::trace::SpanManager;

pub type SnapshotEntry = (
    CompositeKey,
    Option<Unit>,
    Option<SharedString>,
    DebugValue,
);

/// Build a facade whose spans land in an in-memory exporter. The provider
/// must stay alive for as long as spans are created.
pub fn recording_facade() -> (
    Arc<ObservabilityFacade>,
    InMemorySpanExporter,
    SdkTracerProvider,
) {
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    let exporter = InMemorySpanExporter::default();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    let tracer = BoxedTracer::new(Box::new(provider.tracer("test")));

    let config = ObservabilityConfig::default();
    let facade = ObservabilityFacade::new(
        Arc::new(SpanManager::with_tracer(tracer)),
        Arc::new(MetricRegistry::new(true, "")),
        Arc::new(CorrelatedLogger::new(&config)),
    );
    (Arc::new(facade), exporter, provider)
}

/// Run an async block on a current-thread runtime with a debugging metrics
/// recorder installed, returning the block's output and the final metric
/// snapshot. Instruments must be created inside the block.
pub fn block_on_with_recorder<F, Fut, T>(f: F) -> (T, Vec<SnapshotEntry>)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let out = metrics::with_local_recorder(&recorder, || runtime.block_on(f()));
    (out, snapshotter.snapshot().into_vec())
}

/// Sum of a counter across all label sets; `None` if never registered.
pub fn counter_total(snapshot: &[SnapshotEntry], name: &str) -> Option<u64> {
    let mut total = None;
    for (key, _, _, value) in snapshot {
        if key.key().name() == name {
            if let DebugValue::Counter(v) = value {
                *total.get_or_insert(0) += v;
            }
        }
    }
    total
}

/// All recorded values of a histogram across label sets.
pub fn histogram_values(snapshot: &[SnapshotEntry], name: &str) -> Vec<f64> {
    let mut values = Vec::new();
    for (key, _, _, value) in snapshot {
        if key.key().name() == name {
            if let DebugValue::Histogram(observed) = value {
                values.extend(observed.iter().map(|v| v.into_inner()));
            }
        }
    }
    values
}
