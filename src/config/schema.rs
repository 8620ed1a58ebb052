//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! observability facade. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root configuration for the observability facade.
///
/// Service identity fields are stamped as resource attributes on every span
/// and onto every correlated log record.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Logical service name (resource attribute `service.name`).
    pub service_name: String,

    /// Service version (resource attribute `service.version`).
    pub service_version: Option<String>,

    /// Deployment environment (e.g. "development", "production").
    pub environment: String,

    /// Distributed tracing settings.
    pub tracing: TracingConfig,

    /// Metrics settings.
    pub metrics: MetricsConfig,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// HTTP request capture settings for the interceptor.
    pub http: HttpCaptureConfig,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown_service".to_string(),
            service_version: None,
            environment: "development".to_string(),
            tracing: TracingConfig::default(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
            http: HttpCaptureConfig::default(),
        }
    }
}

/// Distributed tracing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Master switch. When false the span manager runs in no-op mode and
    /// never touches the SDK.
    pub enabled: bool,

    /// Which trace backend to export to.
    pub exporter: ExporterBackend,

    /// OTLP collector endpoint (gRPC).
    pub otlp_endpoint: String,

    /// Jaeger endpoint. Jaeger ingests OTLP natively, so this is an OTLP
    /// endpoint as well.
    pub jaeger_endpoint: String,

    /// Zipkin collector endpoint.
    pub zipkin_endpoint: String,

    /// Fraction of root traces sampled, 0.0–1.0. Child spans follow their
    /// parent's decision.
    pub sampling_ratio: f64,

    /// Batch span processor tuning.
    pub span_processor: SpanProcessorConfig,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            exporter: ExporterBackend::Otlp,
            otlp_endpoint: "http://localhost:4317".to_string(),
            jaeger_endpoint: "http://localhost:4317".to_string(),
            zipkin_endpoint: "http://localhost:9411/api/v2/spans".to_string(),
            sampling_ratio: 1.0,
            span_processor: SpanProcessorConfig::default(),
        }
    }
}

/// Trace backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExporterBackend {
    Otlp,
    Jaeger,
    Zipkin,
}

impl fmt::Display for ExporterBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExporterBackend::Otlp => write!(f, "otlp"),
            ExporterBackend::Jaeger => write!(f, "jaeger"),
            ExporterBackend::Zipkin => write!(f, "zipkin"),
        }
    }
}

/// Batch exporter tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpanProcessorConfig {
    /// Maximum number of spans per export batch.
    pub max_export_batch_size: usize,

    /// Delay between consecutive exports (milliseconds).
    pub scheduled_delay_millis: u64,

    /// Maximum number of spans buffered before drops occur.
    pub max_queue_size: usize,

    /// Per-export request timeout (milliseconds), applied to the exporter.
    pub export_timeout_millis: u64,
}

impl Default for SpanProcessorConfig {
    fn default() -> Self {
        Self {
            max_export_batch_size: 512,
            scheduled_delay_millis: 5000,
            max_queue_size: 2048,
            export_timeout_millis: 30_000,
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Master switch. When false the registry hands out no-op instruments.
    pub enabled: bool,

    /// Prepended to every metric name.
    pub prefix: String,

    /// Scrape path exposed by the Prometheus endpoint.
    pub prometheus_endpoint: String,

    /// Port the Prometheus scrape listener binds to.
    pub prometheus_port: u16,

    /// How often observable-gauge callbacks are sampled (milliseconds).
    pub gauge_sample_interval_millis: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: String::new(),
            prometheus_endpoint: "/metrics".to_string(),
            prometheus_port: 9464,
            gauge_sample_interval_millis: 10_000,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Master switch for the subscriber installation.
    pub enabled: bool,

    /// Minimum level, or a full filter directive (`RUST_LOG` syntax).
    pub level: String,

    /// Output format: JSON for production, pretty for development.
    pub format: LogFormat,

    /// Whether log records carry trace/span ids from the active span.
    pub include_trace_context: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            include_trace_context: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Request payload capture for the HTTP interceptor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpCaptureConfig {
    /// Attach (redacted) query parameters as a span attribute.
    pub capture_query: bool,

    /// Buffer and attach (redacted) JSON request bodies as a span attribute.
    pub capture_body: bool,

    /// Bodies larger than this are not buffered.
    pub max_body_bytes: usize,
}

impl Default for HttpCaptureConfig {
    fn default() -> Self {
        Self {
            capture_query: true,
            capture_body: true,
            max_body_bytes: 8192,
        }
    }
}
