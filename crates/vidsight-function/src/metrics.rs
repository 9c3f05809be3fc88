//! Prometheus metrics for the function.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vidsight_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vidsight_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vidsight_http_requests_in_flight";

    // Invocation metrics
    pub const INVOCATIONS_TOTAL: &str = "vidsight_invocations_total";
    pub const ANNOTATION_DURATION_SECONDS: &str = "vidsight_annotation_duration_seconds";

    // Analytic store metrics
    pub const ROWS_APPENDED_TOTAL: &str = "vidsight_rows_appended_total";
    pub const ROW_ERRORS_TOTAL: &str = "vidsight_row_errors_total";
}

/// Invocation outcome label values.
pub mod outcome {
    pub const OK: &str = "ok";
    pub const SKIPPED: &str = "skipped";
    pub const INVALID: &str = "invalid";
    pub const FAILED: &str = "failed";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", route_label(path).to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record the outcome of one event.
pub fn record_invocation(outcome: &'static str) {
    counter!(names::INVOCATIONS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record how long an annotation took end to end.
pub fn record_annotation_duration(duration_secs: f64) {
    histogram!(names::ANNOTATION_DURATION_SECONDS).record(duration_secs);
}

pub fn record_rows_appended(table: &str, rows: usize) {
    let labels = [("table", table.to_string())];
    counter!(names::ROWS_APPENDED_TOTAL, &labels).increment(rows as u64);
}

pub fn record_row_errors(table: &str, rows: usize) {
    let labels = [("table", table.to_string())];
    counter!(names::ROW_ERRORS_TOTAL, &labels).increment(rows as u64);
}

/// Collapse unknown paths so scanners cannot blow up label cardinality.
fn route_label(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/metrics" => "/metrics",
        _ => "other",
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}
