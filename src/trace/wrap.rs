//! Declarative per-method span wrapping.
//!
//! A [`MethodTracer`] is built once per instrumented type with its span
//! manager injected explicitly, then wraps individual method bodies in
//! spans named `Type.method`. This replaces runtime service discovery:
//! construction guarantees a manager is present, so there is no degraded
//! "instrumentation unavailable" path to handle.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use opentelemetry::trace::SpanKind;
use opentelemetry::KeyValue;

use crate::trace::manager::{SpanManager, SpanOptions};
use crate::trace::span::TracedSpan;

/// Method-name substrings that suggest an outbound call.
const CLIENT_METHOD_HINTS: &[&str] = &["fetch", "request", "call", "get"];

/// Infer a span kind from a method name: outbound-sounding names map to
/// CLIENT, everything else to INTERNAL.
pub fn infer_span_kind(method: &str) -> SpanKind {
    let lowered = method.to_ascii_lowercase();
    if CLIENT_METHOD_HINTS.iter().any(|hint| lowered.contains(hint)) {
        SpanKind::Client
    } else {
        SpanKind::Internal
    }
}

/// Wraps the methods of one type in spans.
pub struct MethodTracer {
    spans: Arc<SpanManager>,
    type_name: &'static str,
    kind: Option<SpanKind>,
}

impl MethodTracer {
    /// Tracer for an ordinary type; span kinds are inferred per method.
    pub fn new(spans: Arc<SpanManager>, type_name: &'static str) -> Self {
        Self {
            spans,
            type_name,
            kind: None,
        }
    }

    /// Tracer for a request-handling controller: every method opens a
    /// SERVER span.
    pub fn controller(spans: Arc<SpanManager>, type_name: &'static str) -> Self {
        Self::new(spans, type_name).with_kind(SpanKind::Server)
    }

    /// Force a span kind for every wrapped method.
    pub fn with_kind(mut self, kind: SpanKind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn options(&self, method: &'static str, attributes: Vec<KeyValue>) -> SpanOptions {
        let mut all = vec![
            KeyValue::new("code.namespace", self.type_name),
            KeyValue::new("code.function", method),
        ];
        all.extend(attributes);
        SpanOptions {
            kind: Some(self.kind.clone().unwrap_or_else(|| infer_span_kind(method))),
            links: Vec::new(),
            attributes: all,
        }
    }

    /// Fully-qualified span name for a method.
    pub fn span_name(&self, method: &str) -> String {
        format!("{}.{}", self.type_name, method)
    }

    /// Wrap a synchronous method body.
    pub fn call<T, E, F>(
        &self,
        method: &'static str,
        attributes: Vec<KeyValue>,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&mut TracedSpan) -> Result<T, E>,
        E: fmt::Display,
    {
        self.spans.trace_with(
            &self.span_name(method),
            self.options(method, attributes),
            f,
            |_| Vec::new(),
        )
    }

    /// Wrap an async method body.
    pub async fn call_async<T, E, Fut>(
        &self,
        method: &'static str,
        attributes: Vec<KeyValue>,
        fut: Fut,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.spans
            .trace_async(&self.span_name(method), self.options(method, attributes), fut)
            .await
    }
}
