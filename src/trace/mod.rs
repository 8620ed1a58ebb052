//! Span lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! init.rs (provider, sampler, exporter, propagator)
//!     → manager.rs (SpanManager: create/end/trace, ambient scoping)
//!     → span.rs (TracedSpan: real or no-op, exactly-once end)
//!     → wrap.rs (MethodTracer: declarative per-method wrapping)
//! ```
//!
//! # Design Decisions
//! - Spans are a closed set: a `TracedSpan` is either a live SDK span or
//!   the no-op/ended state, so callers never need capability checks
//! - The ambient "current span" is a task-scoped `Context`, never a
//!   mutable process global
//! - Instrumentation failures degrade to no-op; application errors pass
//!   through unchanged

pub mod init;
pub mod manager;
pub mod span;
pub mod wrap;

pub use init::{init_tracing, TraceInitError};
pub use manager::{SpanManager, SpanOptions};
pub use span::{json_attribute, TracedSpan};
pub use wrap::{infer_span_kind, MethodTracer};

pub use opentelemetry::trace::SpanKind;
