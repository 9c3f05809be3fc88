//! Shared Google Cloud REST plumbing.
//!
//! This crate provides:
//! - Access token sources (gcp_auth-backed cache, static tokens for tests)
//! - Exponential backoff with jitter for transient API failures
//! - Request and retry metrics
//! - HTTP client construction with pooling and timeouts

pub mod auth;
pub mod http;
pub mod metrics;
pub mod retry;

pub use auth::{AuthError, StaticTokenSource, TokenCache, TokenSource, CLOUD_PLATFORM_SCOPE};
pub use http::{
    build_http_client, is_access_token_expired, send_authorized, HttpConfig, HttpReply, SendError,
};
pub use retry::{with_retry, RetryConfig, Retryable};
