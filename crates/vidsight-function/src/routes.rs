//! HTTP routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{handle_event, health};
use crate::metrics::metrics_middleware;
use crate::state::AppState;

/// Create the function router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .route("/", post(handle_event))
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MockAnalyticStore, MockVideoAnnotator};
    use crate::config::FunctionConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router(annotator: MockVideoAnnotator, store: MockAnalyticStore) -> Router {
        let config = FunctionConfig {
            project_id: "p".to_string(),
            max_body_size: 1024,
            ..Default::default()
        };
        let state = AppState::with_backends(config, Arc::new(annotator), Arc::new(store));
        let handle = PrometheusBuilder::new().build_recorder().handle();
        create_router(state, Some(handle))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(MockVideoAnnotator::new(), MockAnalyticStore::new());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_metrics_route() {
        let app = router(MockVideoAnnotator::new(), MockAnalyticStore::new());

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_event_is_bad_request() {
        let mut annotator = MockVideoAnnotator::new();
        annotator.expect_analyze().never();
        let app = router(annotator, MockAnalyticStore::new());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"bucket": "b", "name": "no-extension"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("Invalid event"));
    }

    #[tokio::test]
    async fn test_non_finalize_event_is_skipped() {
        let mut annotator = MockVideoAnnotator::new();
        annotator.expect_analyze().never();
        let app = router(annotator, MockAnalyticStore::new());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("ce-type", "google.cloud.storage.object.v1.metadataUpdated")
                    .body(Body::from(r#"{"bucket": "b", "name": "clip.mp4"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "skipped");
    }

    #[tokio::test]
    async fn test_annotation_failure_is_server_error() {
        let mut annotator = MockVideoAnnotator::new();
        annotator
            .expect_analyze()
            .returning(|_| Err(vidsight_annotator::AnnotateError::Timeout(3600)));
        let app = router(annotator, MockAnalyticStore::new());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .body(Body::from(r#"{"bucket": "b", "name": "clip.mp4"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let app = router(MockVideoAnnotator::new(), MockAnalyticStore::new());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-length", "4096")
                    .body(Body::from(vec![b' '; 4096]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
