//! Function configuration.

use crate::error::{FunctionError, FunctionResult};

/// Settings for one deployment of the function.
///
/// Passed explicitly to the orchestrator and the HTTP layer.
#[derive(Debug, Clone)]
pub struct FunctionConfig {
    /// GCP project that owns the dataset
    pub project_id: String,
    /// BigQuery dataset holding both tables
    pub dataset_id: String,
    /// Table receiving one row per (label, segment)
    pub labels_table: String,
    /// Table receiving one row per transcription
    pub transcripts_table: String,
    /// `gs://` prefix where the service writes its JSON output
    pub output_bucket: String,
    /// Language code for speech transcription
    pub speech_language: String,
    /// Transcriptions below this confidence are left out of the speech report
    pub min_speech_confidence: f64,
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Max request body size
    pub max_body_size: usize,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            dataset_id: "video_analytics".to_string(),
            labels_table: "annotation_labels".to_string(),
            transcripts_table: "annotation_transcripts".to_string(),
            output_bucket: "gs://outputbucket-cloud9".to_string(),
            speech_language: "en-US".to_string(),
            min_speech_confidence: 0.8,
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

impl FunctionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> FunctionResult<Self> {
        let defaults = Self::default();

        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("GOOGLE_CLOUD_PROJECT"))
            .or_else(|_| std::env::var("GCLOUD_PROJECT"))
            .map_err(|_| FunctionError::config("GCP_PROJECT_ID or GOOGLE_CLOUD_PROJECT must be set"))?;

        if project_id.trim().is_empty() {
            return Err(FunctionError::config("GCP_PROJECT_ID cannot be empty"));
        }

        Ok(Self {
            project_id,
            dataset_id: std::env::var("BIGQUERY_DATASET").unwrap_or(defaults.dataset_id),
            labels_table: std::env::var("BIGQUERY_LABELS_TABLE").unwrap_or(defaults.labels_table),
            transcripts_table: std::env::var("BIGQUERY_TRANSCRIPTS_TABLE")
                .unwrap_or(defaults.transcripts_table),
            output_bucket: std::env::var("ANNOTATION_OUTPUT_BUCKET")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.output_bucket),
            speech_language: std::env::var("SPEECH_LANGUAGE_CODE")
                .unwrap_or(defaults.speech_language),
            min_speech_confidence: std::env::var("MIN_SPEECH_CONFIDENCE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_speech_confidence),
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
        })
    }

    /// Both table names, labels first.
    pub fn tables(&self) -> [&str; 2] {
        [&self.labels_table, &self.transcripts_table]
    }
}
