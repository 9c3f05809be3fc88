//! Long-running operation types.

use serde::{Deserialize, Serialize};
use vidsight_models::{AnnotationResultSet, AnnotationStatus};

use crate::error::{AnnotateError, AnnotateResult};

/// `google.longrunning.Operation` for a `videos:annotate` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AnnotateVideoProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AnnotationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AnnotateVideoResponse>,
}

impl Operation {
    /// Final results of a finished operation.
    ///
    /// An operation-level error is terminal; no partial results are returned.
    pub fn into_results(self) -> AnnotateResult<AnnotationResultSet> {
        if let Some(status) = self.error {
            return Err(AnnotateError::OperationFailed {
                code: status.code,
                message: status.message,
            });
        }

        match self.response {
            Some(response) => Ok(response.annotation_results),
            None => Err(AnnotateError::invalid_response(format!(
                "operation {} finished without a response",
                self.name
            ))),
        }
    }

    /// Average progress across inputs, if the service reported any.
    pub fn progress_percent(&self) -> Option<u32> {
        let progress = &self.metadata.as_ref()?.annotation_progress;
        if progress.is_empty() {
            return None;
        }
        let total: u32 = progress.iter().map(|p| p.progress_percent).sum();
        Some(total / progress.len() as u32)
    }
}

/// Operation metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateVideoProgress {
    #[serde(default)]
    pub annotation_progress: Vec<VideoAnnotationProgress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnnotationProgress {
    #[serde(default)]
    pub input_uri: String,
    #[serde(default)]
    pub progress_percent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
}

/// Operation response payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateVideoResponse {
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub type_url: Option<String>,
    #[serde(default)]
    pub annotation_results: AnnotationResultSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_operation() {
        let op: Operation = serde_json::from_str(
            r#"{
                "name": "projects/1/locations/us-east1/operations/42",
                "metadata": {
                    "@type": "type.googleapis.com/google.cloud.videointelligence.v1.AnnotateVideoProgress",
                    "annotationProgress": [
                        {"inputUri": "/b/clip.mp4", "progressPercent": 40, "feature": "LABEL_DETECTION"},
                        {"inputUri": "/b/clip.mp4", "progressPercent": 60, "feature": "SPEECH_TRANSCRIPTION"}
                    ]
                }
            }"#,
        )
        .unwrap();

        assert!(!op.done);
        assert_eq!(op.progress_percent(), Some(50));
    }

    #[test]
    fn test_failed_operation() {
        let op: Operation = serde_json::from_str(
            r#"{"name": "op", "done": true, "error": {"code": 3, "message": "Invalid input URI"}}"#,
        )
        .unwrap();

        match op.into_results() {
            Err(AnnotateError::OperationFailed { code, message }) => {
                assert_eq!(code, 3);
                assert_eq!(message, "Invalid input URI");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_done_without_response() {
        let op = Operation {
            name: "op".to_string(),
            done: true,
            ..Default::default()
        };
        assert!(matches!(
            op.into_results(),
            Err(AnnotateError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_completed_operation() {
        let op: Operation = serde_json::from_str(
            r#"{
                "name": "op",
                "done": true,
                "response": {
                    "@type": "type.googleapis.com/google.cloud.videointelligence.v1.AnnotateVideoResponse",
                    "annotationResults": [
                        {"inputUri": "/b/clip.mp4", "segmentLabelAnnotations": [{"entity": {"description": "dog"}, "segments": [{"segment": {"startTimeOffset": "1s", "endTimeOffset": "2s"}, "confidence": 0.5}]}]},
                        {"inputUri": "/b/clip.mp4"}
                    ]
                }
            }"#,
        )
        .unwrap();

        let results = op.into_results().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results.labels().segment_label_annotations[0].entity.description,
            "dog"
        );
    }
}
