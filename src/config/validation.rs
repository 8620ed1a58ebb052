//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sampling ratio, ports, batch sizes)
//! - Check endpoint URLs are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ObservabilityConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::{ExporterBackend, ObservabilityConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("tracing.sampling_ratio must be within 0.0..=1.0, got {0}")]
    SamplingRatio(f64),

    #[error("tracing.{field} is not a valid URL: {value}")]
    Endpoint { field: &'static str, value: String },

    #[error("tracing.span_processor.max_export_batch_size must be non-zero")]
    ZeroBatchSize,

    #[error("tracing.span_processor.max_export_batch_size ({batch}) exceeds max_queue_size ({queue})")]
    BatchExceedsQueue { batch: usize, queue: usize },

    #[error("metrics.prometheus_port must be non-zero")]
    ZeroPort,

    #[error("metrics.prometheus_endpoint must start with '/', got {0:?}")]
    ScrapePath(String),

    #[error("metrics.prefix contains characters outside [a-zA-Z0-9_:]: {0:?}")]
    MetricPrefix(String),

    #[error("metrics.gauge_sample_interval_millis must be non-zero")]
    ZeroGaugeInterval,

    #[error("logging.level is not a valid filter directive: {0:?}")]
    LogLevel(String),
}

/// Validate a configuration snapshot, collecting every problem found.
pub fn validate_config(config: &ObservabilityConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let ratio = config.tracing.sampling_ratio;
    if !(0.0..=1.0).contains(&ratio) || ratio.is_nan() {
        errors.push(ValidationError::SamplingRatio(ratio));
    }

    // Only the endpoint for the selected backend has to be well formed.
    let (field, endpoint) = match config.tracing.exporter {
        ExporterBackend::Otlp => ("otlp_endpoint", &config.tracing.otlp_endpoint),
        ExporterBackend::Jaeger => ("jaeger_endpoint", &config.tracing.jaeger_endpoint),
        ExporterBackend::Zipkin => ("zipkin_endpoint", &config.tracing.zipkin_endpoint),
    };
    if Url::parse(endpoint).is_err() {
        errors.push(ValidationError::Endpoint {
            field,
            value: endpoint.clone(),
        });
    }

    let processor = &config.tracing.span_processor;
    if processor.max_export_batch_size == 0 {
        errors.push(ValidationError::ZeroBatchSize);
    } else if processor.max_export_batch_size > processor.max_queue_size {
        errors.push(ValidationError::BatchExceedsQueue {
            batch: processor.max_export_batch_size,
            queue: processor.max_queue_size,
        });
    }

    if config.metrics.enabled {
        if config.metrics.prometheus_port == 0 {
            errors.push(ValidationError::ZeroPort);
        }
        if !config.metrics.prometheus_endpoint.starts_with('/') {
            errors.push(ValidationError::ScrapePath(
                config.metrics.prometheus_endpoint.clone(),
            ));
        }
        if !config
            .metrics
            .prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        {
            errors.push(ValidationError::MetricPrefix(config.metrics.prefix.clone()));
        }
        if config.metrics.gauge_sample_interval_millis == 0 {
            errors.push(ValidationError::ZeroGaugeInterval);
        }
    }

    if tracing_subscriber::EnvFilter::try_new(&config.logging.level).is_err() {
        errors.push(ValidationError::LogLevel(config.logging.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
