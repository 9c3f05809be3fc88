//! Rows persisted to the analytic tables.

use serde::{Deserialize, Serialize};

/// One `(label, segment)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRow {
    pub file_name: String,
    pub label: String,
    pub confidence: Option<f64>,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub file_uri: String,
}

/// The top alternative of one transcription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptRow {
    pub file_name: String,
    pub transcript: String,
    pub confidence: Option<f64>,
}
