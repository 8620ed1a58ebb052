//! Unified tracing, metrics, and logging facade for Axum services.
//!
//! # Architecture Overview
//!
//! ```text
//! inbound request
//!     → http::HttpTraceLayer ──── SERVER span, HTTP attributes, metrics
//!         → application handlers
//!             → trace::MethodTracer / ObservabilityFacade ── child spans,
//!               counters, histograms, correlated logs
//!     ← response ──── duration/size histograms, OK/ERROR status, log line
//!
//! Cross-cutting:
//!     config      immutable options snapshot (TOML + validation)
//!     trace       span lifecycle over the OpenTelemetry SDK
//!     metrics     instrument registry + Prometheus scrape endpoint
//!     logging     tracing subscriber + trace-correlated records
//!     lifecycle   ordered startup, flush, graceful shutdown
//! ```
//!
//! Initialize once at startup and wire the layer into a router:
//!
//! ```rust,no_run
//! use observatory::config::ObservabilityConfig;
//!
//! # async fn run() {
//! let observability = observatory::init(ObservabilityConfig::default());
//! let facade = observability.facade();
//!
//! let (set_id, propagate_id) = observatory::http::request_id_layers();
//! let app: axum::Router = axum::Router::new()
//!     .layer(observability.http_layer())
//!     .layer(propagate_id)
//!     .layer(set_id);
//!
//! facade.record_event("startup", &[], None);
//! # observability.shutdown().await;
//! # }
//! ```

// Core subsystems
pub mod config;
pub mod facade;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod trace;

// Cross-cutting concerns
pub mod lifecycle;

pub use config::ObservabilityConfig;
pub use facade::ObservabilityFacade;
pub use http::HttpTraceLayer;
pub use lifecycle::{init, Observability, Shutdown};
pub use trace::{MethodTracer, SpanManager, TracedSpan};
