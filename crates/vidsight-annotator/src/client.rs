//! Video Intelligence REST client.
//!
//! Submits `videos:annotate` and blocks (asynchronously) on the returned
//! long-running operation until it finishes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use tracing::{debug, info, info_span, Instrument};
use vidsight_gcp::metrics::record_request;
use vidsight_gcp::{
    build_http_client, send_authorized, with_retry, HttpConfig, HttpReply, RetryConfig, TokenCache,
    TokenSource,
};
use vidsight_models::{AnalysisRequest, AnnotationResultSet};

use crate::error::{AnnotateError, AnnotateResult};
use crate::operation::Operation;

const DEFAULT_ENDPOINT: &str = "https://videointelligence.googleapis.com";

// =============================================================================
// Configuration
// =============================================================================

/// Annotation client configuration.
#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
    /// API root, without the version segment
    pub endpoint: String,
    /// Delay between operation polls
    pub poll_interval: Duration,
    /// Give up waiting after this long
    pub operation_timeout: Duration,
    /// HTTP client tuning
    pub http: HttpConfig,
    /// Retry policy for individual calls
    pub retry: RetryConfig,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval: Duration::from_secs(10),
            operation_timeout: Duration::from_secs(3600),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl AnnotatorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("VIDEO_INTELLIGENCE_ENDPOINT")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            poll_interval: Duration::from_secs(
                std::env::var("ANNOTATION_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            operation_timeout: Duration::from_secs(
                std::env::var("ANNOTATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
            http: HttpConfig::from_env(),
            retry: RetryConfig::from_env(),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Video Intelligence API client.
#[derive(Clone)]
pub struct AnnotatorClient {
    http: Client,
    config: AnnotatorConfig,
    tokens: Arc<dyn TokenSource>,
}

impl AnnotatorClient {
    /// Create a client with an explicit token source.
    pub fn new(config: AnnotatorConfig, tokens: Arc<dyn TokenSource>) -> AnnotateResult<Self> {
        let http = build_http_client(
            &config.http,
            concat!("vidsight-annotator/", env!("CARGO_PKG_VERSION")),
        )?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    /// Create from environment variables and ambient credentials.
    pub async fn from_env() -> AnnotateResult<Self> {
        let tokens = TokenCache::discover()
            .await
            .map_err(|e| AnnotateError::AuthError(e.0))?;
        Self::new(AnnotatorConfig::from_env(), Arc::new(tokens))
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Submit a request and wait for its results.
    pub async fn annotate(&self, request: &AnalysisRequest) -> AnnotateResult<AnnotationResultSet> {
        let operation = self.submit(request).await?;
        info!(
            operation = %operation.name,
            input_uri = %request.input_uri,
            "Annotation submitted"
        );
        self.wait(operation).await
    }

    /// Start a `videos:annotate` operation.
    pub async fn submit(&self, request: &AnalysisRequest) -> AnnotateResult<Operation> {
        let url = format!("{}/v1/videos:annotate", self.config.endpoint);

        self.execute_request("annotate_video", async {
            with_retry(&self.config.retry, "annotate_video", || async {
                let reply = send_authorized(self.tokens.as_ref(), |token| {
                    self.http.post(&url).bearer_auth(token).json(request)
                })
                .await?;
                Self::parse_operation(&url, reply)
            })
            .await
        })
        .await
    }

    /// Fetch the current state of an operation.
    pub async fn get_operation(&self, name: &str) -> AnnotateResult<Operation> {
        let url = format!("{}/v1/{}", self.config.endpoint, name);

        self.execute_request("get_operation", async {
            with_retry(&self.config.retry, "get_operation", || async {
                let reply = send_authorized(self.tokens.as_ref(), |token| {
                    self.http.get(&url).bearer_auth(token)
                })
                .await?;
                Self::parse_operation(&url, reply)
            })
            .await
        })
        .await
    }

    /// Poll an operation until it is done or the deadline passes.
    pub async fn wait(&self, operation: Operation) -> AnnotateResult<AnnotationResultSet> {
        let deadline = Instant::now() + self.config.operation_timeout;
        let mut operation = operation;

        loop {
            if operation.done {
                return operation.into_results();
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(AnnotateError::Timeout(
                    self.config.operation_timeout.as_secs(),
                ));
            }

            debug!(
                operation = %operation.name,
                progress = ?operation.progress_percent(),
                "Annotation still running"
            );

            tokio::time::sleep(self.config.poll_interval.min(deadline - now)).await;
            operation = self.get_operation(&operation.name).await?;
        }
    }

    fn parse_operation(url: &str, reply: HttpReply) -> AnnotateResult<Operation> {
        match reply.status {
            StatusCode::OK => {
                let operation: Operation = serde_json::from_str(&reply.body).map_err(|e| {
                    AnnotateError::invalid_response(format!(
                        "Failed to parse operation: {} (body prefix: {})",
                        e,
                        reply.body_prefix()
                    ))
                })?;
                if operation.name.is_empty() {
                    return Err(AnnotateError::invalid_response("operation has no name"));
                }
                Ok(operation)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(AnnotateError::RateLimited(
                reply.retry_after_ms.unwrap_or(1000),
            )),
            status => Err(AnnotateError::from_http_status(
                status.as_u16(),
                format!("{} failed: {}", url, reply.body),
            )),
        }
    }

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(&self, operation: &str, fut: F) -> AnnotateResult<T>
    where
        F: std::future::Future<Output = AnnotateResult<T>>,
    {
        let span = info_span!("annotator_request", operation = %operation);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request("videointelligence", operation, status, latency_ms);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_defaults() {
        let config = AnnotatorConfig::default();
        assert_eq!(config.endpoint, "https://videointelligence.googleapis.com");
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.operation_timeout, Duration::from_secs(3600));
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("VIDEO_INTELLIGENCE_ENDPOINT", "http://localhost:9000/");
        std::env::set_var("ANNOTATION_POLL_INTERVAL_SECS", "2");
        std::env::set_var("ANNOTATION_TIMEOUT_SECS", "bogus");

        let config = AnnotatorConfig::from_env();
        assert_eq!(config.endpoint, "http://localhost:9000");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.operation_timeout, Duration::from_secs(3600));

        std::env::remove_var("VIDEO_INTELLIGENCE_ENDPOINT");
        std::env::remove_var("ANNOTATION_POLL_INTERVAL_SECS");
        std::env::remove_var("ANNOTATION_TIMEOUT_SECS");
    }
}
