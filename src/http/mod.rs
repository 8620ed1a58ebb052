//! HTTP boundary subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → request-id layers (tower-http: set + propagate x-request-id)
//!     → interceptor.rs (SERVER span, attributes, metrics, logs)
//!     → application handlers (run under the span's ambient context)
//! ```

pub mod interceptor;
pub mod redact;

pub use interceptor::{HttpTrace, HttpTraceLayer};
pub use redact::{is_sensitive_key, redact_value, redacted, REDACTED};

use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer,
};

/// Request-id layers in the order they should wrap a router: generate an
/// `x-request-id` for requests that lack one, and echo it on responses.
/// Apply them outside [`HttpTraceLayer`] so the interceptor sees the id.
pub fn request_id_layers() -> (
    SetRequestIdLayer<MakeRequestUuid>,
    PropagateRequestIdLayer,
) {
    (
        SetRequestIdLayer::x_request_id(MakeRequestUuid),
        PropagateRequestIdLayer::x_request_id(),
    )
}
