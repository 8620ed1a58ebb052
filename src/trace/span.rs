//! Span handle with a built-in no-op variant.

use opentelemetry::global::BoxedSpan;
use opentelemetry::trace::{Span as _, SpanContext, Status, TraceContextExt};
use opentelemetry::{Context, Key, KeyValue, Value};

/// Placeholder attached when an attribute value cannot be serialized.
pub const UNSERIALIZABLE: &str = "[unserializable]";

/// A unit of traced work.
///
/// Either wraps a live SDK span or holds nothing at all, in which case every
/// method is a safe no-op. The empty state doubles as the post-`end` state:
/// ending a span takes the inner value, so a span can only be ended once and
/// mutations after the end are silently ignored.
pub struct TracedSpan {
    inner: Option<BoxedSpan>,
}

impl std::fmt::Debug for TracedSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracedSpan")
            .field("recording", &self.is_recording())
            .finish()
    }
}

impl TracedSpan {
    /// Wrap a live SDK span.
    pub(crate) fn real(span: BoxedSpan) -> Self {
        Self { inner: Some(span) }
    }

    /// The no-op span: allocates nothing, records nothing, always safe.
    pub const fn noop() -> Self {
        Self { inner: None }
    }

    /// Whether this span currently records anything.
    pub fn is_recording(&self) -> bool {
        self.inner.as_ref().is_some_and(|s| s.is_recording())
    }

    /// Set a single attribute.
    pub fn set_attribute(&mut self, attribute: KeyValue) {
        if let Some(span) = self.inner.as_mut() {
            span.set_attribute(attribute);
        }
    }

    /// Set several attributes at once.
    pub fn set_attributes(&mut self, attributes: impl IntoIterator<Item = KeyValue>) {
        if let Some(span) = self.inner.as_mut() {
            span.set_attributes(attributes);
        }
    }

    /// Attach a structured value as a JSON-serialized attribute.
    pub fn set_json_attribute(&mut self, key: &'static str, value: &serde_json::Value) {
        self.set_attribute(json_attribute(key, value));
    }

    /// Add a timestamped event annotation.
    pub fn add_event(&mut self, name: impl Into<String>, attributes: Vec<KeyValue>) {
        if let Some(span) = self.inner.as_mut() {
            span.add_event(name.into(), attributes);
        }
    }

    /// Record an exception event in the standard attribute shape.
    pub fn record_exception(&mut self, message: &str) {
        self.add_event(
            "exception",
            vec![KeyValue::new("exception.message", message.to_string())],
        );
    }

    /// Set the terminal status.
    pub fn set_status(&mut self, status: Status) {
        if let Some(span) = self.inner.as_mut() {
            span.set_status(status);
        }
    }

    /// End the span. Idempotent: the first call ends it, later calls and
    /// any subsequent mutation are no-ops.
    pub fn end(&mut self) {
        if let Some(mut span) = self.inner.take() {
            span.end();
        }
    }

    /// Identity of the underlying span, if it is live.
    pub fn span_context(&self) -> Option<SpanContext> {
        self.inner.as_ref().map(|s| s.span_context().clone())
    }

    /// Hex trace id, if live.
    pub fn trace_id(&self) -> Option<String> {
        self.span_context().map(|c| c.trace_id().to_string())
    }

    /// Hex span id, if live.
    pub fn span_id(&self) -> Option<String> {
        self.span_context().map(|c| c.span_id().to_string())
    }

    /// Move the span into `base` as its active span, returning the context
    /// that makes it the ambient parent for whatever runs under it.
    ///
    /// For the no-op variant this is just a clone of `base`: no context
    /// manipulation happens when tracing is off. The returned context keeps
    /// the SDK span alive; finish it through [`Context::span`] accessors.
    pub(crate) fn into_context(mut self, base: &Context) -> Context {
        match self.inner.take() {
            Some(span) => base.with_span(span),
            None => base.clone(),
        }
    }
}

// Dropping a live span ends it with the drop timestamp (SDK semantics), so
// spans are never leaked un-ended even when a task is cancelled.

/// Build a span attribute from an arbitrary JSON value.
///
/// Strings, numbers, and booleans map to native attribute types; objects
/// and arrays are JSON-serialized. Serialization failure falls back to a
/// fixed placeholder rather than propagating.
pub fn json_attribute(key: impl Into<Key>, value: &serde_json::Value) -> KeyValue {
    let value = match value {
        serde_json::Value::String(s) => Value::from(s.clone()),
        serde_json::Value::Bool(b) => Value::from(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else {
                Value::from(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::Null => Value::from("null"),
        other => match serde_json::to_string(other) {
            Ok(serialized) => Value::from(serialized),
            Err(_) => Value::from(UNSERIALIZABLE),
        },
    };
    KeyValue::new(key, value)
}
