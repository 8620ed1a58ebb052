//! HTTP request interception.
//!
//! # Responsibilities
//! - Open one SERVER span per inbound request with standard attributes
//! - Run the handler under the span's ambient context
//! - Record request/error counters and duration/size histograms
//! - Emit one correlated log line per request
//!
//! # Design Decisions
//! - One terminal outcome per request: completion or failure, never both
//! - Handler errors are recorded and returned unchanged; a 5xx response
//!   takes the failure accounting while passing through untouched
//! - Captured payloads are redacted before they reach span attributes
//! - Span end on cancellation falls out of drop semantics

use std::fmt;
use std::task::{Context as TaskContext, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{header, HeaderMap, Request};
use axum::response::Response;
use futures_util::future::BoxFuture;
use opentelemetry::trace::{FutureExt as OtelFutureExt, SpanKind, Status, TraceContextExt};
use opentelemetry::{Context, KeyValue};
use opentelemetry_http::HeaderExtractor;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower::{Layer, Service};
use uuid::Uuid;

use crate::config::HttpCaptureConfig;
use crate::facade::ObservabilityFacade;
use crate::http::redact::redacted;
use crate::metrics::http::HttpLabels;
use crate::trace::{json_attribute, SpanOptions};

/// Layer that wraps a service in request interception.
#[derive(Clone)]
pub struct HttpTraceLayer {
    facade: Arc<ObservabilityFacade>,
    capture: HttpCaptureConfig,
}

impl HttpTraceLayer {
    pub fn new(facade: Arc<ObservabilityFacade>) -> Self {
        Self {
            facade,
            capture: HttpCaptureConfig::default(),
        }
    }

    /// Override the payload-capture settings.
    pub fn with_capture(mut self, capture: HttpCaptureConfig) -> Self {
        self.capture = capture;
        self
    }
}

impl<S> Layer<S> for HttpTraceLayer {
    type Service = HttpTrace<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpTrace {
            inner,
            facade: self.facade.clone(),
            capture: self.capture.clone(),
        }
    }
}

/// The per-request interception service.
#[derive(Clone)]
pub struct HttpTrace<S> {
    inner: S,
    facade: Arc<ObservabilityFacade>,
    capture: HttpCaptureConfig,
}

impl<S> Service<Request<Body>> for HttpTrace<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: fmt::Display + Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // take the service that was polled ready, leave the clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let facade = self.facade.clone();
        let capture = self.capture.clone();

        Box::pin(async move {
            let start = Instant::now();
            let method = req.method().to_string();
            let path = req.uri().path().to_string();
            let route = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched| matched.as_str().to_string())
                .unwrap_or_else(|| path.clone());
            let request_id = req
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let request_size = content_length(req.headers());

            let parent_cx = extract_remote_context(req.headers());

            let mut attributes = vec![
                KeyValue::new("http.request.method", method.clone()),
                KeyValue::new("url.full", req.uri().to_string()),
                KeyValue::new("http.route", route.clone()),
                KeyValue::new("http.request.id", request_id.clone()),
            ];
            if let Some(host) = header_str(req.headers(), header::HOST) {
                attributes.push(KeyValue::new("server.address", host));
            }
            if let Some(user_agent) = header_str(req.headers(), header::USER_AGENT) {
                attributes.push(KeyValue::new("user_agent.original", user_agent));
            }
            if capture.capture_query {
                if let Some(query) = req.uri().query() {
                    attributes.push(json_attribute(
                        "http.request.query",
                        &redacted(query_to_json(query)),
                    ));
                }
            }

            let req = match capture_body(req, &capture, request_size).await {
                (req, Some(body)) => {
                    attributes.push(json_attribute("http.request.body", &redacted(body)));
                    req
                }
                (req, None) => req,
            };

            let span = facade.spans().create_span_in(
                &parent_cx,
                format!("HTTP {method} {path}"),
                attributes,
                SpanOptions::kind(SpanKind::Server),
            );
            let trace_cx = span.into_context(&parent_cx);

            let result = inner.call(req).with_context(trace_cx.clone()).await;
            let elapsed = start.elapsed().as_secs_f64();

            match result {
                Ok(response) => {
                    let status = response.status();
                    let labels = HttpLabels {
                        method: method.clone(),
                        route,
                        status: status.as_u16(),
                    };
                    let metrics = facade.metrics();
                    metrics.record_http_request_duration(elapsed, &labels);
                    if let Some(size) = request_size {
                        metrics.record_http_request_size(size, &labels);
                    }
                    if let Some(size) = content_length(response.headers()) {
                        metrics.record_http_response_size(size, &labels);
                    }

                    let span = trace_cx.span();
                    span.set_attribute(KeyValue::new(
                        "http.response.status_code",
                        status.as_u16() as i64,
                    ));

                    let metadata =
                        request_metadata(&method, &path, &request_id, elapsed, Some(status.as_u16()));
                    if status.is_server_error() {
                        metrics.increment_http_errors(&labels);
                        span.set_status(Status::error(format!("HTTP {}", status.as_u16())));
                        span.end();
                        facade.logger().error(
                            "request failed",
                            Some("HttpTrace"),
                            None,
                            Some(metadata),
                        );
                    } else {
                        metrics.increment_http_requests(&labels);
                        span.set_status(Status::Ok);
                        span.end();
                        facade
                            .logger()
                            .info("request completed", Some("HttpTrace"), Some(metadata));
                    }

                    Ok(response)
                }
                Err(error) => {
                    let labels = HttpLabels {
                        method: method.clone(),
                        route,
                        status: 500,
                    };
                    let metrics = facade.metrics();
                    metrics.increment_http_errors(&labels);
                    metrics.record_http_request_duration(elapsed, &labels);

                    let message = error.to_string();
                    let span = trace_cx.span();
                    span.add_event(
                        "exception",
                        vec![KeyValue::new("exception.message", message.clone())],
                    );
                    span.set_status(Status::error(message.clone()));
                    span.end();

                    facade.logger().error(
                        &message,
                        Some("HttpTrace"),
                        None,
                        Some(request_metadata(&method, &path, &request_id, elapsed, None)),
                    );

                    // the handler's error is forwarded untouched
                    Err(error)
                }
            }
        })
    }
}

/// Extract a remote parent from the W3C trace headers, layered over the
/// ambient context.
fn extract_remote_context(headers: &HeaderMap) -> Context {
    opentelemetry::global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(headers))
    })
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn content_length(headers: &HeaderMap) -> Option<f64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse::<f64>()
        .ok()
}

fn query_to_json(query: &str) -> Value {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        map.insert(key.into_owned(), Value::String(value.into_owned()));
    }
    Value::Object(map)
}

fn is_json(headers: &HeaderMap) -> bool {
    header_str(headers, header::CONTENT_TYPE)
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Buffer a JSON body within the size cap, returning the request with the
/// body restored plus the parsed payload. Anything else passes through.
async fn capture_body(
    req: Request<Body>,
    capture: &HttpCaptureConfig,
    request_size: Option<f64>,
) -> (Request<Body>, Option<Value>) {
    let within_cap =
        request_size.is_some_and(|size| size as usize <= capture.max_body_bytes);
    if !capture.capture_body || !within_cap || !is_json(req.headers()) {
        return (req, None);
    }

    let (parts, body) = req.into_parts();
    match axum::body::to_bytes(body, capture.max_body_bytes).await {
        Ok(bytes) => {
            let payload = serde_json::from_slice::<Value>(&bytes).ok();
            (Request::from_parts(parts, Body::from(bytes)), payload)
        }
        Err(error) => {
            // a failed body read would have failed the handler too
            tracing::debug!(error = %error, "request body capture failed");
            (Request::from_parts(parts, Body::empty()), None)
        }
    }
}

fn request_metadata(
    method: &str,
    path: &str,
    request_id: &str,
    elapsed_secs: f64,
    status: Option<u16>,
) -> Value {
    let mut metadata = json!({
        "method": method,
        "path": path,
        "request_id": request_id,
        "duration_ms": elapsed_secs * 1000.0,
    });
    if let (Value::Object(map), Some(status)) = (&mut metadata, status) {
        map.insert("status".to_string(), json!(status));
    }
    metadata
}
