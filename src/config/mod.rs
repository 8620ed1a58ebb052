//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file / defaults
//!     → schema.rs (serde deserialization, defaults)
//!     → validation.rs (semantic checks, all errors collected)
//!     → ObservabilityConfig (immutable snapshot, injected everywhere)
//! ```
//!
//! # Design Decisions
//! - The snapshot is built once at startup and never mutated afterward
//! - Every field has a default so an empty file is a valid configuration
//! - Validation is separate from parsing and reports all problems at once

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ExporterBackend, HttpCaptureConfig, LogFormat, LoggingConfig, MetricsConfig,
    ObservabilityConfig, SpanProcessorConfig, TracingConfig,
};
pub use validation::{validate_config, ValidationError};
