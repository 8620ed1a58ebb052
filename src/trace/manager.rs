//! Span creation and finalization.

use std::fmt;
use std::future::Future;

use opentelemetry::global::BoxedTracer;
use opentelemetry::trace::{FutureExt, Link, SpanKind, Status, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};

use crate::trace::span::TracedSpan;

/// Options applied when opening a span.
#[derive(Debug, Default)]
pub struct SpanOptions {
    /// Span kind; defaults to INTERNAL.
    pub kind: Option<SpanKind>,

    /// Links to spans in other traces.
    pub links: Vec<Link>,

    /// Attributes attached at creation time.
    pub attributes: Vec<KeyValue>,
}

impl SpanOptions {
    /// Options for a span of the given kind.
    pub fn kind(kind: SpanKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }
}

/// Owns creation and finalization of spans.
///
/// When the tracing pillar is disabled there is no tracer and every
/// operation hands out the no-op span without touching the SDK; wrapped
/// application code behaves identically either way.
pub struct SpanManager {
    tracer: Option<BoxedTracer>,
}

impl SpanManager {
    /// A manager backed by a real tracer.
    pub fn with_tracer(tracer: BoxedTracer) -> Self {
        Self {
            tracer: Some(tracer),
        }
    }

    /// A manager in no-op mode (tracing disabled or initialization failed).
    pub fn disabled() -> Self {
        Self { tracer: None }
    }

    /// Whether spans created here record anything.
    pub fn is_enabled(&self) -> bool {
        self.tracer.is_some()
    }

    /// Open a span as a child of the ambient current span.
    ///
    /// Never fails: with tracing disabled this returns the no-op span.
    pub fn create_span(
        &self,
        name: impl Into<String>,
        attributes: Vec<KeyValue>,
        options: SpanOptions,
    ) -> TracedSpan {
        self.create_span_in(&Context::current(), name, attributes, options)
    }

    /// Open a span under an explicit parent context.
    pub fn create_span_in(
        &self,
        parent: &Context,
        name: impl Into<String>,
        attributes: Vec<KeyValue>,
        options: SpanOptions,
    ) -> TracedSpan {
        let Some(tracer) = &self.tracer else {
            return TracedSpan::noop();
        };

        let mut builder = tracer
            .span_builder(name.into())
            .with_kind(options.kind.unwrap_or(SpanKind::Internal));
        if !options.links.is_empty() {
            builder = builder.with_links(options.links);
        }
        let mut all = options.attributes;
        all.extend(attributes);
        if !all.is_empty() {
            builder = builder.with_attributes(all);
        }

        TracedSpan::real(builder.start_with_context(tracer, parent))
    }

    /// Finalize a span: merge `extra_attributes`, set the terminal status,
    /// and end it. Safe to call on the no-op span or an already-ended span.
    ///
    /// Status rules: `success` ⇒ OK; failure with an error ⇒ ERROR carrying
    /// the error's message plus a recorded exception; failure without one ⇒
    /// a generic ERROR.
    pub fn end_span(
        &self,
        span: &mut TracedSpan,
        success: bool,
        error: Option<&dyn fmt::Display>,
        extra_attributes: Vec<KeyValue>,
    ) {
        span.set_attributes(extra_attributes);
        if success {
            span.set_status(Status::Ok);
        } else if let Some(error) = error {
            let message = error.to_string();
            span.record_exception(&message);
            span.set_status(Status::error(message));
        } else {
            span.set_status(Status::error("operation failed"));
        }
        span.end();
    }

    /// Run `f` inside a span, ending it on every exit path.
    ///
    /// An `Err` marks the span before being returned unchanged; the error's
    /// type, message, and identity are never altered.
    pub fn trace<T, E, F>(&self, name: &str, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut TracedSpan) -> Result<T, E>,
        E: fmt::Display,
    {
        self.trace_with(name, SpanOptions::default(), f, |_| Vec::new())
    }

    /// [`trace`](Self::trace) with explicit options and an extractor that
    /// derives extra attributes from the successful result.
    pub fn trace_with<T, E, F, X>(
        &self,
        name: &str,
        options: SpanOptions,
        f: F,
        extract: X,
    ) -> Result<T, E>
    where
        F: FnOnce(&mut TracedSpan) -> Result<T, E>,
        X: FnOnce(&T) -> Vec<KeyValue>,
        E: fmt::Display,
    {
        let mut span = self.create_span(name, Vec::new(), options);
        let result = f(&mut span);
        match &result {
            Ok(value) => self.end_span(&mut span, true, None, extract(value)),
            Err(error) => self.end_span(&mut span, false, Some(error), Vec::new()),
        }
        result
    }

    /// Async form of [`trace`](Self::trace). The span is not published as
    /// the ambient current span; use [`with_active_span`](Self::with_active_span)
    /// for that.
    pub async fn trace_async<T, E, Fut>(
        &self,
        name: &str,
        options: SpanOptions,
        fut: Fut,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut span = self.create_span(name, Vec::new(), options);
        let result = fut.await;
        match &result {
            Ok(_) => self.end_span(&mut span, true, None, Vec::new()),
            Err(error) => self.end_span(&mut span, false, Some(error), Vec::new()),
        }
        result
    }

    /// Run a future with a new span published as the ambient current span.
    ///
    /// Spans created during the future's execution become children, and
    /// `Context::current()` observes the span at every poll. The scope is
    /// task-local: concurrently running tasks never see each other's span.
    /// With tracing disabled the future runs untouched and no context
    /// manipulation happens.
    pub async fn with_active_span<T, E, F, Fut>(
        &self,
        name: &str,
        attributes: Vec<KeyValue>,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        if self.tracer.is_none() {
            return f().await;
        }

        let span = self.create_span(name, attributes, SpanOptions::default());
        let cx = span.into_context(&Context::current());
        let result = f().with_context(cx.clone()).await;

        let span = cx.span();
        match &result {
            Ok(_) => span.set_status(Status::Ok),
            Err(error) => {
                let message = error.to_string();
                span.add_event(
                    "exception",
                    vec![KeyValue::new("exception.message", message.clone())],
                );
                span.set_status(Status::error(message));
            }
        }
        span.end();

        result
    }
}
