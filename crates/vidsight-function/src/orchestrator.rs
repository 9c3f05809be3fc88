//! Per-event pipeline: annotate, report, provision, append.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::Instrument;
use vidsight_models::AnalysisEvent;

use crate::backends::{AnalyticStore, VideoAnnotator};
use crate::config::FunctionConfig;
use crate::error::FunctionResult;
use crate::logging::InvocationLogger;
use crate::metrics;
use crate::projector::{project, AppendReport, ResultProjector};
use crate::report::{format_labels, format_speech};
use crate::request_builder::build_request;
use crate::schema::SchemaProvisioner;

/// Summary of a handled event.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationReport {
    pub invocation_id: String,
    pub input_uri: String,
    pub tables: AppendReport,
}

/// Entry point for one storage event.
#[derive(Clone)]
pub struct Orchestrator {
    config: Arc<FunctionConfig>,
    annotator: Arc<dyn VideoAnnotator>,
    store: Arc<dyn AnalyticStore>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<FunctionConfig>,
        annotator: Arc<dyn VideoAnnotator>,
        store: Arc<dyn AnalyticStore>,
    ) -> Self {
        Self {
            config,
            annotator,
            store,
        }
    }

    pub fn config(&self) -> &FunctionConfig {
        &self.config
    }

    /// Handle one event.
    ///
    /// Annotation and provisioning failures are returned. Append failures
    /// are not: they are logged and show up in the report.
    pub async fn handle(&self, event: &AnalysisEvent) -> FunctionResult<InvocationReport> {
        let logger = InvocationLogger::new(event);
        let span = logger.span(event);
        self.run(event, &logger).instrument(span).await
    }

    async fn run(
        &self,
        event: &AnalysisEvent,
        logger: &InvocationLogger,
    ) -> FunctionResult<InvocationReport> {
        logger.log_start(&format!("object {} in bucket {}", event.object_name, event.bucket));

        let request = build_request(&self.config, event);

        let start = Instant::now();
        let results = match self.annotator.analyze(&request).await {
            Ok(results) => results,
            Err(e) => {
                logger.log_error(&format!("annotation failed: {}", e));
                return Err(e.into());
            }
        };
        metrics::record_annotation_duration(start.elapsed().as_secs_f64());
        logger.log_progress(&format!(
            "annotation finished with {} result object(s)",
            results.len()
        ));

        for status in results.errors() {
            logger.log_warning(&format!(
                "annotation result error (code {}): {}",
                status.code, status.message
            ));
        }

        logger.log_report("labels", &format_labels(&results.labels()));
        logger.log_report(
            "speech",
            &format_speech(&results.speech(), self.config.min_speech_confidence),
        );

        if let Err(e) = SchemaProvisioner::new(self.store.as_ref(), &self.config)
            .ensure_tables()
            .await
        {
            logger.log_error(&format!("table provisioning failed: {}", e));
            return Err(e);
        }

        let rows = project(&request.input_uri, &results);
        let tables = ResultProjector::new(self.store.as_ref(), &self.config)
            .append(&rows)
            .await;

        logger.log_completion(&format!(
            "{} label row(s), {} transcript row(s)",
            rows.labels.len(),
            rows.transcripts.len()
        ));

        Ok(InvocationReport {
            invocation_id: logger.invocation_id().to_string(),
            input_uri: request.input_uri,
            tables,
        })
    }
}
