//! Metrics subsystem.
//!
//! # Data Flow
//! ```text
//! registry.rs (name-keyed instrument caches, no-op fallback)
//!     → http.rs (fixed-name HTTP traffic recorders)
//!     → collector.rs (periodic sampling of observable-gauge callbacks)
//!     → exporter.rs (Prometheus scrape endpoint)
//! ```
//!
//! # Metrics
//! - `http_requests_total` (counter): completed requests by method, route, status
//! - `http_request_errors_total` (counter): failed requests by method, route, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//! - `http_request_size_bytes` / `http_response_size_bytes` (histograms)
//!
//! # Design Decisions
//! - Instruments are cached per fully-qualified name; repeated lookups
//!   return handles over the same underlying instrument
//! - Disabled mode hands out no-op instruments so callers never null-check
//! - Instruments bind to the recorder installed at creation time, so the
//!   exporter must be installed before the registry is built

pub mod collector;
pub mod exporter;
pub mod http;
pub mod registry;

pub use collector::spawn_gauge_collector;
pub use exporter::{init_prometheus, MetricsInitError};
pub use registry::{InstrumentOptions, MetricRegistry};
