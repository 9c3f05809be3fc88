//! Function error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use vidsight_annotator::AnnotateError;
use vidsight_bigquery::BigQueryError;
use vidsight_models::ModelError;

pub type FunctionResult<T> = Result<T, FunctionError>;

#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Annotation error: {0}")]
    Annotation(#[from] AnnotateError),

    #[error("Analytic store error: {0}")]
    Store(#[from] BigQueryError),
}

impl FunctionError {
    pub fn invalid_event(msg: impl Into<String>) -> Self {
        Self::InvalidEvent(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Malformed events get a 4xx so the trigger does not redeliver them.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidEvent(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Annotation(_) | Self::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEvent(_) => "invalid_event",
            Self::Config(_) => "config",
            Self::Annotation(_) => "annotation",
            Self::Store(_) => "store",
        }
    }
}

impl From<ModelError> for FunctionError {
    fn from(err: ModelError) -> Self {
        Self::InvalidEvent(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
