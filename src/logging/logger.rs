//! Trace-correlated structured logging.

use opentelemetry::trace::TraceContextExt;
use opentelemetry::Context;
use serde_json::{Map, Value};

use crate::config::ObservabilityConfig;
use crate::logging::record::{LogLevel, LogRecord};

const LOG_TARGET: &str = "observatory";

/// Emits structured log records stamped with service metadata and, when a
/// span is active, the ambient trace/span ids.
///
/// Dispatch goes through the `tracing` macros, so every call is safe no
/// matter whether or when the subscriber was installed.
pub struct CorrelatedLogger {
    service_name: String,
    environment: String,
    include_trace_context: bool,
}

impl CorrelatedLogger {
    pub fn new(config: &ObservabilityConfig) -> Self {
        Self {
            service_name: config.service_name.clone(),
            environment: config.environment.clone(),
            include_trace_context: config.logging.include_trace_context,
        }
    }

    pub fn debug(&self, message: &str, context: Option<&str>, metadata: Option<Value>) {
        self.emit(self.record(LogLevel::Debug, message, context, None, metadata));
    }

    pub fn info(&self, message: &str, context: Option<&str>, metadata: Option<Value>) {
        self.emit(self.record(LogLevel::Info, message, context, None, metadata));
    }

    pub fn warn(&self, message: &str, context: Option<&str>, metadata: Option<Value>) {
        self.emit(self.record(LogLevel::Warn, message, context, None, metadata));
    }

    /// `stack`, when given, is merged into metadata under the `trace` key.
    pub fn error(
        &self,
        message: &str,
        context: Option<&str>,
        stack: Option<&str>,
        metadata: Option<Value>,
    ) {
        self.emit(self.record(LogLevel::Error, message, context, stack, metadata));
    }

    pub fn fatal(
        &self,
        message: &str,
        context: Option<&str>,
        stack: Option<&str>,
        metadata: Option<Value>,
    ) {
        self.emit(self.record(LogLevel::Fatal, message, context, stack, metadata));
    }

    /// Build the record without emitting it.
    pub fn record(
        &self,
        level: LogLevel,
        message: &str,
        context: Option<&str>,
        stack: Option<&str>,
        metadata: Option<Value>,
    ) -> LogRecord {
        let mut map = match metadata {
            Some(Value::Object(map)) => map,
            Some(other) => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
            None => Map::new(),
        };
        if let Some(stack) = stack {
            map.insert("trace".to_string(), Value::String(stack.to_string()));
        }

        let (trace_id, span_id) = self.current_trace_ids();

        LogRecord {
            level,
            message: message.to_string(),
            context: context.map(str::to_string),
            service: self.service_name.clone(),
            environment: self.environment.clone(),
            trace_id,
            span_id,
            metadata: map,
        }
    }

    fn current_trace_ids(&self) -> (Option<String>, Option<String>) {
        if !self.include_trace_context {
            return (None, None);
        }
        let cx = Context::current();
        let span = cx.span();
        let span_context = span.span_context();
        if span_context.is_valid() {
            (
                Some(span_context.trace_id().to_string()),
                Some(span_context.span_id().to_string()),
            )
        } else {
            (None, None)
        }
    }

    fn emit(&self, record: LogRecord) {
        macro_rules! emit_at {
            ($macro:ident) => {
                match (&record.trace_id, &record.span_id) {
                    (Some(trace_id), Some(span_id)) => tracing::$macro!(
                        target: LOG_TARGET,
                        severity = %record.level,
                        context = record.context.as_deref().unwrap_or(""),
                        service = %record.service,
                        environment = %record.environment,
                        trace_id = %trace_id,
                        span_id = %span_id,
                        metadata = %record.metadata_json(),
                        "{}",
                        record.message
                    ),
                    _ => tracing::$macro!(
                        target: LOG_TARGET,
                        severity = %record.level,
                        context = record.context.as_deref().unwrap_or(""),
                        service = %record.service,
                        environment = %record.environment,
                        metadata = %record.metadata_json(),
                        "{}",
                        record.message
                    ),
                }
            };
        }

        match record.level {
            LogLevel::Debug => emit_at!(debug),
            LogLevel::Info => emit_at!(info),
            LogLevel::Warn => emit_at!(warn),
            LogLevel::Error | LogLevel::Fatal => emit_at!(error),
        }
    }
}
