//! Flattens annotation results into rows and appends them.

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use vidsight_bigquery::RowInsertError;
use vidsight_models::{AnnotationResultSet, LabelRow, TranscriptRow};

use crate::backends::AnalyticStore;
use crate::config::FunctionConfig;
use crate::metrics;

/// Rows derived from one annotation result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedRows {
    pub labels: Vec<LabelRow>,
    pub transcripts: Vec<TranscriptRow>,
}

/// Result of appending to one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableAppendOutcome {
    /// All rows accepted.
    Inserted(usize),
    /// Nothing to insert.
    Skipped,
    /// The store rejected some rows.
    RowErrors(Vec<RowInsertError>),
    /// The append call itself failed.
    StoreFailed(String),
}

impl TableAppendOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Inserted(_) | Self::Skipped)
    }

    /// Rows the store kept. `insertAll` without `skipInvalidRows` rejects the
    /// whole batch when any row is invalid, so a row error means none landed.
    pub fn rows_appended(&self) -> usize {
        match self {
            Self::Inserted(count) => *count,
            _ => 0,
        }
    }
}

/// Per-table append outcomes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppendReport {
    pub labels: TableAppendOutcome,
    pub transcripts: TableAppendOutcome,
}

/// Last `/`-separated component of a URI.
pub fn file_name(file_uri: &str) -> &str {
    file_uri.rsplit('/').next().unwrap_or(file_uri)
}

/// One label row per (label, segment), one transcript row per transcription.
pub fn project(file_uri: &str, results: &AnnotationResultSet) -> ProjectedRows {
    let name = file_name(file_uri);

    let labels = results
        .labels()
        .segment_label_annotations
        .iter()
        .flat_map(|annotation| {
            annotation.segments.iter().map(move |segment| LabelRow {
                file_name: name.to_string(),
                label: annotation.entity.description.clone(),
                confidence: Some(segment.confidence),
                start_time: Some(segment.segment.start_time_offset),
                end_time: Some(segment.segment.end_time_offset),
                file_uri: file_uri.to_string(),
            })
        })
        .collect();

    let transcripts = results
        .speech()
        .speech_transcriptions
        .iter()
        .filter_map(|transcription| match transcription.top_alternative() {
            Some(alt) => Some(TranscriptRow {
                file_name: name.to_string(),
                transcript: alt.transcript.clone(),
                confidence: Some(alt.confidence),
            }),
            None => {
                warn!(file_uri = %file_uri, "Transcription has no alternatives, no row written");
                None
            }
        })
        .collect();

    ProjectedRows {
        labels,
        transcripts,
    }
}

/// Appends projected rows, one independent call per table.
pub struct ResultProjector<'a> {
    store: &'a dyn AnalyticStore,
    config: &'a FunctionConfig,
}

impl<'a> ResultProjector<'a> {
    pub fn new(store: &'a dyn AnalyticStore, config: &'a FunctionConfig) -> Self {
        Self { store, config }
    }

    /// Append both row sets.
    ///
    /// Never fails: row rejections and store errors are logged and reported
    /// in the returned outcome, and one table's failure does not stop the
    /// other table's append.
    pub async fn append(&self, rows: &ProjectedRows) -> AppendReport {
        let labels = self.append_table(&self.config.labels_table, &rows.labels).await;
        let transcripts = self
            .append_table(&self.config.transcripts_table, &rows.transcripts)
            .await;

        AppendReport {
            labels,
            transcripts,
        }
    }

    async fn append_table<T: Serialize>(&self, table_id: &str, rows: &[T]) -> TableAppendOutcome {
        if rows.is_empty() {
            info!(table = %table_id, "No rows for table '{}', skipping insert", table_id);
            return TableAppendOutcome::Skipped;
        }

        let values = match rows.iter().map(serde_json::to_value).collect::<Result<Vec<Value>, _>>() {
            Ok(values) => values,
            Err(e) => {
                error!(table = %table_id, "Failed to encode rows for '{}': {}", table_id, e);
                return TableAppendOutcome::StoreFailed(e.to_string());
            }
        };

        match self.store.insert_rows(table_id, values).await {
            Ok(errors) if errors.is_empty() => {
                info!(
                    table = %table_id,
                    rows = rows.len(),
                    "New rows have been added to the '{}' table.", table_id
                );
                let outcome = TableAppendOutcome::Inserted(rows.len());
                metrics::record_rows_appended(table_id, outcome.rows_appended());
                outcome
            }
            Ok(errors) => {
                let detail: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                warn!(
                    table = %table_id,
                    failed_rows = errors.len(),
                    total_rows = rows.len(),
                    "Encountered errors while inserting rows into '{}' table: {}",
                    table_id,
                    detail.join("; ")
                );
                metrics::record_row_errors(table_id, errors.len());
                TableAppendOutcome::RowErrors(errors)
            }
            Err(e) => {
                error!(table = %table_id, "Error inserting rows into BigQuery: {}", e);
                metrics::record_row_errors(table_id, rows.len());
                TableAppendOutcome::StoreFailed(e.to_string())
            }
        }
    }
}
