//! Integration tests for the HTTP request interceptor.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use opentelemetry::trace::{SpanKind, Status};
use serde_json::json;
use tower::ServiceExt;

use observatory::http::HttpTraceLayer;
use observatory::metrics::http::{
    HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUEST_ERRORS_TOTAL, HTTP_REQUESTS_TOTAL,
};

mod common;

#[test]
fn completed_request_records_duration_and_count() {
    let ((status, spans), snapshot) = common::block_on_with_recorder(|| async {
        let (facade, exporter, _provider) = common::recording_facade();
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    "ok"
                }),
            )
            .layer(HttpTraceLayer::new(facade));

        let response = app
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        (response.status(), exporter.get_finished_spans().unwrap())
    });

    assert_eq!(status, StatusCode::OK);

    // exactly one duration observation, at least as long as the handler
    let durations = common::histogram_values(&snapshot, HTTP_REQUEST_DURATION_SECONDS);
    assert_eq!(durations.len(), 1);
    assert!(durations[0] >= 0.050, "duration was {}", durations[0]);

    assert_eq!(common::counter_total(&snapshot, HTTP_REQUESTS_TOTAL), Some(1));
    assert_eq!(common::counter_total(&snapshot, HTTP_REQUEST_ERRORS_TOTAL), None);

    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name, "HTTP GET /slow");
    assert_eq!(spans[0].span_kind, SpanKind::Server);
    assert_eq!(spans[0].status, Status::Ok);
    assert!(spans[0]
        .attributes
        .iter()
        .any(|kv| kv.key.as_str() == "http.route"));
}

#[test]
fn failed_handler_propagates_error_unchanged() {
    let ((error, spans), snapshot) = common::block_on_with_recorder(|| async {
        let (facade, exporter, _provider) = common::recording_facade();
        let service = tower::ServiceBuilder::new()
            .layer(HttpTraceLayer::new(facade))
            .service(tower::service_fn(|_req: Request<Body>| async {
                Err::<Response, std::io::Error>(std::io::Error::other("boom"))
            }));

        let error = service
            .oneshot(Request::builder().uri("/fail").body(Body::empty()).unwrap())
            .await
            .unwrap_err();
        (error, exporter.get_finished_spans().unwrap())
    });

    // same type, same message, same kind
    assert_eq!(error.to_string(), "boom");
    assert_eq!(error.kind(), std::io::ErrorKind::Other);

    assert_eq!(
        common::counter_total(&snapshot, HTTP_REQUEST_ERRORS_TOTAL),
        Some(1)
    );
    assert_eq!(common::counter_total(&snapshot, HTTP_REQUESTS_TOTAL), None);
    assert_eq!(
        common::histogram_values(&snapshot, HTTP_REQUEST_DURATION_SECONDS).len(),
        1
    );

    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].status, Status::error("boom".to_string()));
    assert!(spans[0].events.events.iter().any(|e| e.name == "exception"));
}

#[test]
fn server_error_response_takes_failure_accounting() {
    let ((status, spans), snapshot) = common::block_on_with_recorder(|| async {
        let (facade, exporter, _provider) = common::recording_facade();
        let app = Router::new()
            .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .layer(HttpTraceLayer::new(facade));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/broken")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        (response.status(), exporter.get_finished_spans().unwrap())
    });

    // the response passes through untouched
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(
        common::counter_total(&snapshot, HTTP_REQUEST_ERRORS_TOTAL),
        Some(1)
    );
    assert_eq!(common::counter_total(&snapshot, HTTP_REQUESTS_TOTAL), None);
    assert_eq!(spans[0].status, Status::error("HTTP 500".to_string()));
}

#[test]
fn captured_body_is_redacted_but_forwarded_intact() {
    let payload = json!({"password": "p1", "nested": {"token": "t1", "ok": "v"}});
    let body_bytes = serde_json::to_vec(&payload).unwrap();

    let ((echoed, spans), _snapshot) = common::block_on_with_recorder(|| async {
        let (facade, exporter, _provider) = common::recording_facade();
        let app = Router::new()
            .route("/login", post(|body: String| async { body }))
            .layer(HttpTraceLayer::new(facade));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::CONTENT_LENGTH, body_bytes.len())
                    .body(Body::from(body_bytes.clone()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let echoed = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (echoed, exporter.get_finished_spans().unwrap())
    });

    // the handler saw the original body
    let echoed: serde_json::Value = serde_json::from_slice(&echoed).unwrap();
    assert_eq!(echoed, payload);

    // the span attribute saw the redacted one
    let attribute = spans[0]
        .attributes
        .iter()
        .find(|kv| kv.key.as_str() == "http.request.body")
        .expect("body attribute missing");
    let captured = attribute.value.as_str();
    assert!(captured.contains("[REDACTED]"));
    assert!(!captured.contains("p1"));
    assert!(!captured.contains("t1"));
    assert!(captured.contains(r#""ok":"v""#));
}

#[test]
fn query_parameters_are_redacted() {
    let ((_, spans), _snapshot) = common::block_on_with_recorder(|| async {
        let (facade, exporter, _provider) = common::recording_facade();
        let app = Router::new()
            .route("/search", get(|| async { "ok" }))
            .layer(HttpTraceLayer::new(facade));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/search?q=books&api_key=sk-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        (response.status(), exporter.get_finished_spans().unwrap())
    });

    let attribute = spans[0]
        .attributes
        .iter()
        .find(|kv| kv.key.as_str() == "http.request.query")
        .expect("query attribute missing");
    let captured = attribute.value.as_str();
    assert!(captured.contains("books"));
    assert!(!captured.contains("sk-123"));
}

#[test]
fn handler_spans_nest_under_the_request_span() {
    let ((_, spans), _snapshot) = common::block_on_with_recorder(|| async {
        let (facade, exporter, _provider) = common::recording_facade();
        let handler_facade = facade.clone();
        let app = Router::new()
            .route(
                "/nested",
                get(move || {
                    let facade = handler_facade.clone();
                    async move {
                        facade
                            .spans()
                            .trace("inner", |_span| Ok::<_, String>(()))
                            .unwrap();
                        "ok"
                    }
                }),
            )
            .layer(HttpTraceLayer::new(facade));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/nested")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        (response.status(), exporter.get_finished_spans().unwrap())
    });

    assert_eq!(spans.len(), 2);
    let inner = spans.iter().find(|s| s.name == "inner").unwrap();
    let server = spans.iter().find(|s| s.name.starts_with("HTTP")).unwrap();
    assert_eq!(inner.parent_span_id, server.span_context.span_id());
    assert_eq!(
        inner.span_context.trace_id(),
        server.span_context.trace_id()
    );
}

#[test]
fn remote_traceparent_becomes_the_span_parent() {
    let ((_, spans), _snapshot) = common::block_on_with_recorder(|| async {
        let (facade, exporter, _provider) = common::recording_facade();
        let app = Router::new()
            .route("/traced", get(|| async { "ok" }))
            .layer(HttpTraceLayer::new(facade));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/traced")
                    .header(
                        "traceparent",
                        "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01",
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        (response.status(), exporter.get_finished_spans().unwrap())
    });

    assert_eq!(
        spans[0].span_context.trace_id().to_string(),
        "0af7651916cd43dd8448eb211c80319c"
    );
    assert_eq!(
        spans[0].parent_span_id.to_string(),
        "b7ad6b7169203331"
    );
}
