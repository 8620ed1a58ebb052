//! Tracer provider construction and global registration.

use std::time::Duration;

use opentelemetry::global;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{
    BatchConfig, BatchConfigBuilder, BatchSpanProcessor, RandomIdGenerator, Sampler,
    SdkTracerProvider,
};
use opentelemetry_sdk::Resource;
use thiserror::Error;

use crate::config::{ExporterBackend, ObservabilityConfig};

/// Errors raised while initializing the tracing pillar.
///
/// These never abort startup: the caller logs them and degrades the pillar
/// to no-op mode.
#[derive(Debug, Error)]
pub enum TraceInitError {
    #[error("failed to build {backend} span exporter: {message}")]
    Exporter {
        backend: ExporterBackend,
        message: String,
    },
}

/// Build the provider, register it and the W3C propagator globally, and
/// return it for lifecycle ownership (flush/shutdown).
pub fn init_tracing(config: &ObservabilityConfig) -> Result<SdkTracerProvider, TraceInitError> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let provider = build_tracer_provider(config)?;
    global::set_tracer_provider(provider.clone());

    tracing::info!(
        exporter = %config.tracing.exporter,
        sampling_ratio = config.tracing.sampling_ratio,
        "tracer provider initialized"
    );
    Ok(provider)
}

fn build_tracer_provider(
    config: &ObservabilityConfig,
) -> Result<SdkTracerProvider, TraceInitError> {
    let mut resource = Resource::builder().with_service_name(config.service_name.clone());
    if let Some(version) = &config.service_version {
        resource = resource.with_attribute(KeyValue::new("service.version", version.clone()));
    }
    let resource = resource
        .with_attribute(KeyValue::new(
            "deployment.environment",
            config.environment.clone(),
        ))
        .build();

    let sampler = Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
        config.tracing.sampling_ratio,
    )));

    let processor = build_span_processor(config)?;

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(sampler)
        .with_id_generator(RandomIdGenerator::default())
        .with_span_processor(processor)
        .build())
}

fn build_span_processor(config: &ObservabilityConfig) -> Result<BatchSpanProcessor, TraceInitError> {
    let tracing_config = &config.tracing;
    let backend = tracing_config.exporter;

    match backend {
        // Jaeger ingests OTLP natively, so both backends share the exporter
        // and differ only in their endpoint.
        ExporterBackend::Otlp | ExporterBackend::Jaeger => {
            let endpoint = match backend {
                ExporterBackend::Otlp => &tracing_config.otlp_endpoint,
                _ => &tracing_config.jaeger_endpoint,
            };
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint.clone())
                .with_timeout(Duration::from_millis(
                    tracing_config.span_processor.export_timeout_millis,
                ))
                .build()
                .map_err(|e| TraceInitError::Exporter {
                    backend,
                    message: e.to_string(),
                })?;
            Ok(BatchSpanProcessor::builder(exporter)
                .with_batch_config(batch_config(config))
                .build())
        }
        ExporterBackend::Zipkin => {
            let exporter = opentelemetry_zipkin::ZipkinExporter::builder()
                .with_collector_endpoint(tracing_config.zipkin_endpoint.clone())
                .build()
                .map_err(|e| TraceInitError::Exporter {
                    backend,
                    message: e.to_string(),
                })?;
            Ok(BatchSpanProcessor::builder(exporter)
                .with_batch_config(batch_config(config))
                .build())
        }
    }
}

fn batch_config(config: &ObservabilityConfig) -> BatchConfig {
    let processor = &config.tracing.span_processor;
    BatchConfigBuilder::default()
        .with_max_export_batch_size(processor.max_export_batch_size)
        .with_scheduled_delay(Duration::from_millis(processor.scheduled_delay_millis))
        .with_max_queue_size(processor.max_queue_size)
        .build()
}
