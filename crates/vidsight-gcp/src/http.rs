//! HTTP client construction and authorized request execution.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use thiserror::Error;

use crate::auth::{AuthError, TokenSource};

/// HTTP client tuning shared by the API clients.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl HttpConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            timeout: Duration::from_secs(
                std::env::var("GCP_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            connect_timeout: Duration::from_secs(
                std::env::var("GCP_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

/// Build a pooled HTTP client.
pub fn build_http_client(config: &HttpConfig, user_agent: &str) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(10)
        .user_agent(user_agent)
        .build()
}

/// True if a 401 body says the bearer token expired (as opposed to being
/// rejected outright).
pub fn is_access_token_expired(body: &str) -> bool {
    body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
}

/// Failure to get a reply at all.
#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Fully read HTTP reply.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: String,
    /// `Retry-After` in milliseconds, when the server sent one in seconds.
    pub retry_after_ms: Option<u64>,
}

impl HttpReply {
    async fn read(response: Response) -> reqwest::Result<Self> {
        let status = response.status();
        let retry_after_ms = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs.saturating_mul(1000));
        let body = response.text().await?;

        Ok(Self {
            status,
            body,
            retry_after_ms,
        })
    }

    /// First 200 bytes of the body, for error messages.
    pub fn body_prefix(&self) -> &str {
        let mut end = self.body.len().min(200);
        while !self.body.is_char_boundary(end) {
            end -= 1;
        }
        &self.body[..end]
    }
}

/// Send a request with a bearer token.
///
/// `build` is called once per attempt with the token to use. A 401 caused
/// by an expired token invalidates the cached token and is retried once.
pub async fn send_authorized<F>(tokens: &dyn TokenSource, build: F) -> Result<HttpReply, SendError>
where
    F: Fn(&str) -> RequestBuilder,
{
    let token = tokens.access_token().await?;
    let reply = HttpReply::read(build(&token).send().await?).await?;

    if reply.status == StatusCode::UNAUTHORIZED && is_access_token_expired(&reply.body) {
        tokens.invalidate().await;
        let token = tokens.access_token().await?;
        return Ok(HttpReply::read(build(&token).send().await?).await?);
    }

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_token_expired_detection() {
        assert!(is_access_token_expired(
            r#"{"error": {"status": "UNAUTHENTICATED", "details": [{"reason": "ACCESS_TOKEN_EXPIRED"}]}}"#
        ));
        assert!(!is_access_token_expired(r#"{"error": {"status": "PERMISSION_DENIED"}}"#));
    }

    #[test]
    fn test_body_prefix_respects_char_boundaries() {
        let reply = HttpReply {
            status: StatusCode::BAD_REQUEST,
            body: "é".repeat(150),
            retry_after_ms: None,
        };
        let prefix = reply.body_prefix();
        assert!(prefix.len() <= 200);
        assert!(prefix.chars().all(|c| c == 'é'));
    }

    #[test]
    #[serial]
    fn test_http_config_from_env() {
        std::env::set_var("GCP_REQUEST_TIMEOUT_SECS", "15");
        std::env::set_var("GCP_CONNECT_TIMEOUT_SECS", "not-a-number");
        let config = HttpConfig::from_env();
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        std::env::remove_var("GCP_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("GCP_CONNECT_TIMEOUT_SECS");
    }
}
