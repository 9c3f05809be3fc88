//! Google API metrics.
//!
//! - Request counters by service, operation and status
//! - Latency histograms
//! - Retry counters

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total Google API requests by service, operation and status.
    pub const REQUESTS_TOTAL: &str = "vidsight_gcp_requests_total";

    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "vidsight_gcp_retries_total";

    /// Request latency in seconds by service and operation.
    pub const LATENCY_SECONDS: &str = "vidsight_gcp_latency_seconds";
}

/// Record metrics for a completed request.
pub fn record_request(service: &'static str, operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "service" => service,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "service" => service,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::REQUESTS_TOTAL.contains("requests"));
        assert!(names::RETRIES_TOTAL.contains("retries"));
        assert!(names::LATENCY_SECONDS.contains("latency"));
    }
}
