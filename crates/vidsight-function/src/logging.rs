//! Structured invocation logging.
//!
//! Each event is handled inside an `invocation` span; the logger adds the
//! invocation ID and input URI to every line so they survive JSON output
//! even when spans are not rendered.

use tracing::{error, info, info_span, warn, Span};
use uuid::Uuid;
use vidsight_models::AnalysisEvent;

/// Logger for one handled event.
#[derive(Debug, Clone)]
pub struct InvocationLogger {
    invocation_id: String,
    input_uri: String,
}

impl InvocationLogger {
    /// Start logging for an event under a fresh invocation ID.
    pub fn new(event: &AnalysisEvent) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), event)
    }

    pub fn with_id(invocation_id: impl Into<String>, event: &AnalysisEvent) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            input_uri: event.input_uri(),
        }
    }

    /// Span to run the invocation in.
    pub fn span(&self, event: &AnalysisEvent) -> Span {
        info_span!(
            "invocation",
            invocation_id = %self.invocation_id,
            bucket = %event.bucket,
            object = %event.object_name
        )
    }

    pub fn log_start(&self, message: &str) {
        info!(
            invocation_id = %self.invocation_id,
            input_uri = %self.input_uri,
            "Invocation started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            invocation_id = %self.invocation_id,
            input_uri = %self.input_uri,
            "Invocation progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            invocation_id = %self.invocation_id,
            input_uri = %self.input_uri,
            "Invocation warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            invocation_id = %self.invocation_id,
            input_uri = %self.input_uri,
            "Invocation error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            invocation_id = %self.invocation_id,
            input_uri = %self.input_uri,
            "Invocation completed: {}", message
        );
    }

    /// Emit a formatted report, one log line per report line.
    pub fn log_report(&self, report: &str, lines: &[String]) {
        for line in lines {
            info!(
                invocation_id = %self.invocation_id,
                report = report,
                "{}", line
            );
        }
    }

    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    pub fn input_uri(&self) -> &str {
        &self.input_uri
    }
}
