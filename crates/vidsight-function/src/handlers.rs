//! HTTP handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::cloud_event::{parse_event, ParsedEvent};
use crate::error::{FunctionError, FunctionResult};
use crate::metrics::{self, outcome};
use crate::projector::AppendReport;
use crate::state::AppState;

/// Response for a handled or skipped event.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<AppendReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

/// Storage trigger endpoint.
///
/// Malformed events answer 400 so they are not redelivered; annotation and
/// provisioning failures answer 500 so the trigger may retry.
pub async fn handle_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> FunctionResult<Json<EventResponse>> {
    let event = match parse_event(&headers, &body) {
        Ok(ParsedEvent::Analyze(event)) => event,
        Ok(ParsedEvent::Ignored(event_type)) => {
            info!(event_type = %event_type, "Ignoring non-finalize event");
            metrics::record_invocation(outcome::SKIPPED);
            return Ok(Json(EventResponse {
                status: "skipped",
                input_uri: None,
                invocation_id: None,
                tables: None,
                event_type: Some(event_type),
            }));
        }
        Err(e) => {
            metrics::record_invocation(outcome::INVALID);
            return Err(e);
        }
    };

    match state.orchestrator.handle(&event).await {
        Ok(report) => {
            metrics::record_invocation(outcome::OK);
            Ok(Json(EventResponse {
                status: "ok",
                input_uri: Some(report.input_uri),
                invocation_id: Some(report.invocation_id),
                tables: Some(report.tables),
                event_type: None,
            }))
        }
        Err(e) => {
            let label = match e {
                FunctionError::InvalidEvent(_) => outcome::INVALID,
                _ => outcome::FAILED,
            };
            metrics::record_invocation(label);
            Err(e)
        }
    }
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
