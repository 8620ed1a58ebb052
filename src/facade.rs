//! Unified entry point over the three pillars.

use std::sync::Arc;

use opentelemetry::trace::{Status, TraceContextExt};
use opentelemetry::{Context, KeyValue};
use serde_json::{Map, Value};

use crate::logging::CorrelatedLogger;
use crate::metrics::registry::{MetricAttributes, MetricRegistry};
use crate::trace::SpanManager;

/// Composes the span manager, metric registry, and correlated logger into
/// the operations application code calls day to day. The pillar services
/// stay exposed for callers that need lower-level control.
pub struct ObservabilityFacade {
    spans: Arc<SpanManager>,
    metrics: Arc<MetricRegistry>,
    logger: Arc<CorrelatedLogger>,
}

impl ObservabilityFacade {
    pub fn new(
        spans: Arc<SpanManager>,
        metrics: Arc<MetricRegistry>,
        logger: Arc<CorrelatedLogger>,
    ) -> Self {
        Self {
            spans,
            metrics,
            logger,
        }
    }

    pub fn spans(&self) -> &Arc<SpanManager> {
        &self.spans
    }

    pub fn metrics(&self) -> &Arc<MetricRegistry> {
        &self.metrics
    }

    pub fn logger(&self) -> &Arc<CorrelatedLogger> {
        &self.logger
    }

    /// Record a domain event: bumps `event.{name}.count`, annotates the
    /// ambient span, and emits an info log (default message `Event: {name}`).
    pub fn record_event(
        &self,
        name: &str,
        attributes: MetricAttributes<'_>,
        message: Option<&str>,
    ) {
        self.metrics
            .increment_counter(&format!("event.{name}.count"), 1, attributes);

        let cx = Context::current();
        cx.span()
            .add_event(name.to_string(), to_key_values(attributes));

        let default_message = format!("Event: {name}");
        self.logger.info(
            message.unwrap_or(&default_message),
            None,
            metadata_from(attributes),
        );
    }

    /// Record an application error: bumps `error.{context}.count` (context
    /// defaults to `application`), marks the ambient span, and emits an
    /// error log carrying the error's message and source chain.
    pub fn record_error(
        &self,
        error: &(dyn std::error::Error + '_),
        context: Option<&str>,
        attributes: MetricAttributes<'_>,
    ) {
        let scope = context.unwrap_or("application");
        self.metrics
            .increment_counter(&format!("error.{scope}.count"), 1, attributes);

        let message = error.to_string();
        let cx = Context::current();
        let span = cx.span();
        span.add_event(
            "exception",
            vec![KeyValue::new("exception.message", message.clone())],
        );
        span.set_status(Status::error(message.clone()));

        let chain = source_chain(error);
        self.logger
            .error(&message, context, chain.as_deref(), metadata_from(attributes));
    }

    /// Record a duration observation into histogram `duration.{name}`.
    pub fn measure_duration(&self, name: &str, duration_ms: f64, attributes: MetricAttributes<'_>) {
        self.metrics
            .record_histogram(&format!("duration.{name}"), duration_ms, attributes);
    }

    /// Set gauge `name` to `value`. The latest recorded value is the one
    /// reported; repeated calls always take effect.
    pub fn record_gauge_metric(&self, name: &str, value: f64, attributes: MetricAttributes<'_>) {
        self.metrics.set_gauge(name, value, attributes);
    }
}

fn to_key_values(attributes: MetricAttributes<'_>) -> Vec<KeyValue> {
    attributes
        .iter()
        .map(|(key, value)| KeyValue::new(*key, value.clone()))
        .collect()
}

fn metadata_from(attributes: MetricAttributes<'_>) -> Option<Value> {
    if attributes.is_empty() {
        return None;
    }
    let map: Map<String, Value> = attributes
        .iter()
        .map(|(key, value)| (key.to_string(), Value::String(value.clone())))
        .collect();
    Some(Value::Object(map))
}

fn source_chain(error: &(dyn std::error::Error + '_)) -> Option<String> {
    let mut parts = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" caused by: "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    fn test_facade() -> ObservabilityFacade {
        let config = crate::config::ObservabilityConfig::default();
        ObservabilityFacade::new(
            Arc::new(SpanManager::disabled()),
            Arc::new(MetricRegistry::new(true, "")),
            Arc::new(CorrelatedLogger::new(&config)),
        )
    }

    fn counter_value(snapshot: &[(metrics_util::CompositeKey, Option<metrics::Unit>, Option<metrics::SharedString>, DebugValue)], name: &str) -> Option<u64> {
        snapshot.iter().find_map(|(key, _, _, value)| {
            if key.key().name() == name {
                match value {
                    DebugValue::Counter(v) => Some(*v),
                    _ => None,
                }
            } else {
                None
            }
        })
    }

    #[test]
    fn record_error_increments_scoped_counter() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, || {
            let facade = test_facade();
            let error = std::io::Error::other("boom");
            facade.record_error(&error, Some("Ctx"), &[]);
        });

        let snapshot = snapshotter.snapshot().into_vec();
        assert_eq!(counter_value(&snapshot, "error.Ctx.count"), Some(1));
    }

    #[test]
    fn record_error_defaults_scope_to_application() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, || {
            let facade = test_facade();
            let error = std::io::Error::other("boom");
            facade.record_error(&error, None, &[]);
        });

        let snapshot = snapshotter.snapshot().into_vec();
        assert_eq!(counter_value(&snapshot, "error.application.count"), Some(1));
    }

    #[test]
    fn record_event_counts_and_names_by_event() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, || {
            let facade = test_facade();
            facade.record_event("user.signup", &[("plan", "pro".to_string())], None);
            facade.record_event("user.signup", &[("plan", "pro".to_string())], None);
        });

        let snapshot = snapshotter.snapshot().into_vec();
        assert_eq!(counter_value(&snapshot, "event.user.signup.count"), Some(2));
    }

    #[test]
    fn measure_duration_records_histogram() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, || {
            let facade = test_facade();
            facade.measure_duration("checkout", 12.5, &[]);
        });

        let snapshot = snapshotter.snapshot().into_vec();
        let found = snapshot.iter().any(|(key, _, _, value)| {
            key.key().name() == "duration.checkout"
                && matches!(value, DebugValue::Histogram(values) if !values.is_empty())
        });
        assert!(found);
    }

    #[test]
    fn gauge_updates_take_latest_value() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, || {
            let facade = test_facade();
            facade.record_gauge_metric("pool.size", 5.0, &[]);
            facade.record_gauge_metric("pool.size", 9.0, &[]);
        });

        let snapshot = snapshotter.snapshot().into_vec();
        let found = snapshot.iter().any(|(key, _, _, value)| {
            key.key().name() == "pool.size" && *value == DebugValue::Gauge(9.0.into())
        });
        assert!(found);
    }
}
