//! Storage trigger payloads.
//!
//! Accepts the delivery shapes used for "object finalized" notifications:
//! - CloudEvents binary mode: `ce-*` headers, body is the object resource
//! - CloudEvents structured mode: `{"type": ..., "data": {...}}`
//! - Background-function envelope: `{"context": {"eventType": ...}, "data": {...}}`
//! - The bare object resource (`{"bucket": ..., "name": ...}`)

use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::Value;
use vidsight_models::AnalysisEvent;

use crate::error::{FunctionError, FunctionResult};

/// CloudEvents type for a finalized object.
pub const OBJECT_FINALIZED: &str = "google.cloud.storage.object.v1.finalized";

/// Background-function event type for a finalized object.
pub const LEGACY_OBJECT_FINALIZE: &str = "google.storage.object.finalize";

const CE_TYPE_HEADER: &str = "ce-type";

/// The storage object fields the function reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObjectData {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    /// A finalized object to analyze.
    Analyze(AnalysisEvent),
    /// Some other event type; acknowledged without work.
    Ignored(String),
}

/// Parse a trigger delivery into an event.
pub fn parse_event(headers: &HeaderMap, body: &[u8]) -> FunctionResult<ParsedEvent> {
    if body.is_empty() {
        return Err(FunctionError::invalid_event("empty request body"));
    }

    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| FunctionError::invalid_event(format!("body is not JSON: {}", e)))?;

    let header_type = headers
        .get(CE_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (event_type, data) = match header_type {
        Some(event_type) => (Some(event_type), payload),
        None => split_envelope(payload),
    };

    if let Some(event_type) = event_type {
        if event_type != OBJECT_FINALIZED && event_type != LEGACY_OBJECT_FINALIZE {
            return Ok(ParsedEvent::Ignored(event_type));
        }
    }

    let object: StorageObjectData = serde_json::from_value(data)
        .map_err(|e| FunctionError::invalid_event(format!("unexpected event data: {}", e)))?;

    let event = AnalysisEvent::new(
        object.bucket.unwrap_or_default(),
        object.name.unwrap_or_default(),
    )?;

    Ok(ParsedEvent::Analyze(event))
}

/// Pull the event type and data out of an enveloped payload.
fn split_envelope(mut payload: Value) -> (Option<String>, Value) {
    let data = match payload.get_mut("data") {
        Some(data) if data.is_object() => data.take(),
        _ => return (None, payload),
    };

    let event_type = payload
        .get("type")
        .or_else(|| payload.pointer("/context/eventType"))
        .or_else(|| payload.get("eventType"))
        .and_then(Value::as_str)
        .map(str::to_string);

    (event_type, data)
}
