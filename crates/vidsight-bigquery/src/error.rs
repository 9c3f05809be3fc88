//! BigQuery error types.

use thiserror::Error;
use vidsight_gcp::{Retryable, SendError};

/// Result type for BigQuery operations.
pub type BigQueryResult<T> = Result<T, BigQueryError>;

/// Errors that can occur during BigQuery operations.
#[derive(Debug, Error)]
pub enum BigQueryError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Rate limited, retry after {0}ms")]
    RateLimited(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BigQueryError {
    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map an HTTP error status to an error variant.
    pub fn from_http_status(status: u16, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match status {
            401 => Self::AuthError(msg),
            403 => Self::PermissionDenied(msg),
            404 => Self::NotFound(msg),
            409 => Self::AlreadyExists(msg),
            429 => Self::RateLimited(1000),
            500..=599 => Self::ServerError(status, msg),
            _ => Self::RequestFailed(msg),
        }
    }

    /// HTTP status this error corresponds to, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::AuthError(_) => Some(401),
            Self::PermissionDenied(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::AlreadyExists(_) => Some(409),
            Self::RateLimited(_) => Some(429),
            Self::ServerError(status, _) => Some(*status),
            Self::RequestFailed(_) => Some(400),
            _ => None,
        }
    }
}

impl Retryable for BigQueryError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited(_) | Self::ServerError(_, _)
        )
    }

    fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited(ms) => Some(*ms),
            _ => None,
        }
    }
}

impl From<SendError> for BigQueryError {
    fn from(err: SendError) -> Self {
        match err {
            SendError::Auth(e) => Self::AuthError(e.0),
            SendError::Network(e) => Self::Network(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_http_status_404() {
        let err = BigQueryError::from_http_status(404, "not found");
        assert!(matches!(err, BigQueryError::NotFound(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_from_http_status_409() {
        let err = BigQueryError::from_http_status(409, "duplicate");
        assert!(matches!(err, BigQueryError::AlreadyExists(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_from_http_status_429() {
        let err = BigQueryError::from_http_status(429, "rate limited");
        assert!(matches!(err, BigQueryError::RateLimited(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_from_http_status_5xx() {
        for status in [500, 502, 503] {
            let err = BigQueryError::from_http_status(status, "server");
            assert!(matches!(err, BigQueryError::ServerError(s, _) if s == status));
            assert!(err.is_retryable(), "{} should be retryable", status);
        }
    }

    #[test]
    fn test_error_from_http_status_403() {
        let err = BigQueryError::from_http_status(403, "denied");
        assert!(matches!(err, BigQueryError::PermissionDenied(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_http_status_getter() {
        assert_eq!(BigQueryError::RateLimited(1000).http_status(), Some(429));
        assert_eq!(
            BigQueryError::ServerError(502, "bad gateway".into()).http_status(),
            Some(502)
        );
        assert_eq!(BigQueryError::NotFound("t".into()).http_status(), Some(404));
        assert_eq!(BigQueryError::RateLimited(5000).retry_after_ms(), Some(5000));
    }
}
