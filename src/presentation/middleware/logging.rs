//! Request Logging & Metrics Middleware
//!
//! `TraceLayer` opens one span per request; `track_http_metrics` feeds the
//! Prometheus request counter and latency histogram, labelled by the matched
//! route template rather than the raw path so ids do not explode cardinality.

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    http,
    middleware::Next,
    response::Response,
};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{DefaultOnRequest, DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::infrastructure::metrics;

type MakeSpan = fn(&http::Request<Body>) -> Span;
type RecordResponse = fn(&http::Response<Body>, Duration, &Span);

/// Concrete type of the request span layer
pub type HttpTraceLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, MakeSpan, DefaultOnRequest, RecordResponse>;

fn make_span(request: &http::Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    )
}

fn record_response(response: &http::Response<Body>, latency: Duration, span: &Span) {
    span.record("status", response.status().as_u16());
    span.record("latency_ms", latency.as_millis() as u64);
    DefaultOnResponse::default().on_response(response, latency, span);
}

/// Request span layer
pub fn create_trace_layer() -> HttpTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(make_span as MakeSpan)
        .on_response(record_response as RecordResponse)
}

/// Record request count and latency for Prometheus
pub async fn track_http_metrics(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    metrics::record_http_request(
        &method,
        &route,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_metrics_use_route_template() {
        let app = Router::new()
            .route("/api/products/{slug}", get(|| async { "OK" }))
            .route_layer(middleware::from_fn(track_http_metrics))
            .layer(create_trace_layer());

        let request = http::Request::builder()
            .uri("/api/products/red-roses")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);

        let count = metrics::HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/api/products/{slug}", "200"])
            .get();
        assert!(count >= 1);
    }
}
