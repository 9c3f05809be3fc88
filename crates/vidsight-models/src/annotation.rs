//! Annotation result models.
//!
//! Mirrors the `AnnotateVideoResponse.annotationResults` JSON returned by
//! the Video Intelligence API. Only the fields this system reads are typed;
//! the remaining annotation families are kept as raw JSON.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Detected entity (label, category).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl Entity {
    pub fn named(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }
}

/// A `[start, end]` interval in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSegment {
    #[serde(default, with = "crate::offset")]
    pub start_time_offset: f64,
    #[serde(default, with = "crate::offset")]
    pub end_time_offset: f64,
}

impl TimeSegment {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start_time_offset: start,
            end_time_offset: end,
        }
    }
}

/// One occurrence of a label with its confidence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelSegment {
    #[serde(default)]
    pub segment: TimeSegment,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelAnnotation {
    #[serde(default)]
    pub entity: Entity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category_entities: Vec<Entity>,
    #[serde(default)]
    pub segments: Vec<LabelSegment>,
}

impl LabelAnnotation {
    /// Confidence of the first segment, which is what labels are ranked by.
    pub fn first_segment_confidence(&self) -> Option<f64> {
        self.segments.first().map(|s| s.confidence)
    }
}

/// One transcription hypothesis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechAlternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechTranscription {
    /// Ordered by decreasing confidence.
    #[serde(default)]
    pub alternatives: Vec<SpeechAlternative>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl SpeechTranscription {
    /// The highest-ranked alternative.
    pub fn top_alternative(&self) -> Option<&SpeechAlternative> {
        self.alternatives.first()
    }
}

/// `google.rpc.Status` as embedded in results and operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Results for one video, possibly one feature family only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnnotationResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segment_label_annotations: Vec<LabelAnnotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shot_label_annotations: Vec<LabelAnnotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shot_annotations: Vec<TimeSegment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub speech_transcriptions: Vec<SpeechTranscription>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_annotations: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logo_recognition_annotations: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text_annotations: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub face_detection_annotations: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub person_detection_annotations: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_annotation: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AnnotationStatus>,
}

impl VideoAnnotationResults {
    /// True if this result object carries annotations of the given family.
    pub fn carries(&self, family: ResultFamily) -> bool {
        match family {
            ResultFamily::Labels => {
                !self.segment_label_annotations.is_empty()
                    || !self.shot_label_annotations.is_empty()
                    || !self.shot_annotations.is_empty()
                    || !self.object_annotations.is_empty()
            }
            ResultFamily::Speech => !self.speech_transcriptions.is_empty(),
        }
    }

    /// True if this result object has the annotations the family's report
    /// and rows are built from.
    pub fn feeds(&self, family: ResultFamily) -> bool {
        match family {
            ResultFamily::Labels => !self.segment_label_annotations.is_empty(),
            ResultFamily::Speech => !self.speech_transcriptions.is_empty(),
        }
    }
}

/// Feature families this system consumes from a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultFamily {
    /// Labels, shots and object tracking.
    Labels,
    /// Speech transcription.
    Speech,
}

impl ResultFamily {
    /// Slot the service uses for this family when results are split by
    /// feature in request order.
    pub fn position(&self) -> usize {
        match self {
            Self::Labels => 0,
            Self::Speech => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Labels => "labels",
            Self::Speech => "speech",
        }
    }

    fn other(&self) -> Self {
        match self {
            Self::Labels => Self::Speech,
            Self::Speech => Self::Labels,
        }
    }
}

/// All result objects returned for one annotation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationResultSet(pub Vec<VideoAnnotationResults>);

impl AnnotationResultSet {
    pub fn new(results: Vec<VideoAnnotationResults>) -> Self {
        Self(results)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoAnnotationResults> {
        self.0.iter()
    }

    /// Find the result object for a family.
    ///
    /// Candidates in order: the first result holding the annotations the
    /// family is built from, then the first result carrying any annotation of
    /// the family, then the family's positional slot unless that slot
    /// carries the other family instead.
    pub fn select(&self, family: ResultFamily) -> Option<&VideoAnnotationResults> {
        self.0
            .iter()
            .find(|r| r.feeds(family))
            .or_else(|| self.0.iter().find(|r| r.carries(family)))
            .or_else(|| {
                self.0
                    .get(family.position())
                    .filter(|r| !r.carries(family.other()))
            })
    }

    /// Label/shot/tracking results, or an empty result if none came back.
    pub fn labels(&self) -> Cow<'_, VideoAnnotationResults> {
        self.select_or_empty(ResultFamily::Labels)
    }

    /// Speech transcription results, or an empty result if none came back.
    pub fn speech(&self) -> Cow<'_, VideoAnnotationResults> {
        self.select_or_empty(ResultFamily::Speech)
    }

    fn select_or_empty(&self, family: ResultFamily) -> Cow<'_, VideoAnnotationResults> {
        match self.select(family) {
            Some(results) => Cow::Borrowed(results),
            None => {
                warn!(
                    family = family.as_str(),
                    results = self.0.len(),
                    "No annotation result for family, treating as empty"
                );
                Cow::Owned(VideoAnnotationResults::default())
            }
        }
    }

    /// Per-result errors reported by the service.
    pub fn errors(&self) -> impl Iterator<Item = &AnnotationStatus> {
        self.0.iter().filter_map(|r| r.error.as_ref())
    }
}
