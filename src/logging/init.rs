//! Tracing subscriber installation.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{LogFormat, ObservabilityConfig};

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingInitError {
    #[error("failed to initialize tracing subscriber: {0}")]
    TracingSubscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global subscriber: env filter, JSON or pretty formatting
/// with error-severity records routed to stderr, and (when tracing is up)
/// the bridge exporting `tracing` spans through the provider.
///
/// A no-op when the logging pillar is disabled.
pub fn init_logging(
    config: &ObservabilityConfig,
    bridge: Option<opentelemetry_sdk::trace::SdkTracer>,
) -> Result<(), LoggingInitError> {
    if !config.logging.enabled {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    // error and fatal records are stderr-class, the rest stdout-class
    let writer = std::io::stderr
        .with_max_level(Level::ERROR)
        .or_else(std::io::stdout);

    let fmt_layer = match config.logging.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(writer)
            .boxed(),
    };

    let bridge_layer = bridge.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    tracing_subscriber::registry()
        .with(filter)
        .with(bridge_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
