//! Annotation request models.
//!
//! These serialize directly into the `videos:annotate` request body.

use serde::{Deserialize, Serialize};

/// Annotation feature requested from the Video Intelligence API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureKind {
    ObjectTracking,
    LabelDetection,
    ShotChangeDetection,
    SpeechTranscription,
    LogoRecognition,
    ExplicitContentDetection,
    TextDetection,
    FaceDetection,
    PersonDetection,
}

/// The fixed feature set requested for every video, in request order.
pub const ALL_FEATURES: [FeatureKind; 9] = [
    FeatureKind::ObjectTracking,
    FeatureKind::LabelDetection,
    FeatureKind::ShotChangeDetection,
    FeatureKind::SpeechTranscription,
    FeatureKind::LogoRecognition,
    FeatureKind::ExplicitContentDetection,
    FeatureKind::TextDetection,
    FeatureKind::FaceDetection,
    FeatureKind::PersonDetection,
];

impl FeatureKind {
    /// Wire name of the feature.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ObjectTracking => "OBJECT_TRACKING",
            Self::LabelDetection => "LABEL_DETECTION",
            Self::ShotChangeDetection => "SHOT_CHANGE_DETECTION",
            Self::SpeechTranscription => "SPEECH_TRANSCRIPTION",
            Self::LogoRecognition => "LOGO_RECOGNITION",
            Self::ExplicitContentDetection => "EXPLICIT_CONTENT_DETECTION",
            Self::TextDetection => "TEXT_DETECTION",
            Self::FaceDetection => "FACE_DETECTION",
            Self::PersonDetection => "PERSON_DETECTION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechTranscriptionConfig {
    pub language_code: String,
    pub enable_automatic_punctuation: bool,
}

impl SpeechTranscriptionConfig {
    pub fn new(language_code: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            enable_automatic_punctuation: true,
        }
    }
}

impl Default for SpeechTranscriptionConfig {
    fn default() -> Self {
        Self::new("en-US")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDetectionConfig {
    pub include_bounding_boxes: bool,
    pub include_attributes: bool,
    pub include_pose_landmarks: bool,
}

impl Default for PersonDetectionConfig {
    fn default() -> Self {
        Self {
            include_bounding_boxes: true,
            include_attributes: false,
            include_pose_landmarks: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceDetectionConfig {
    pub include_bounding_boxes: bool,
    pub include_attributes: bool,
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        Self {
            include_bounding_boxes: true,
            include_attributes: true,
        }
    }
}

/// Borrowed view of the configuration attached to one feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureConfig<'a> {
    Speech(&'a SpeechTranscriptionConfig),
    Person(&'a PersonDetectionConfig),
    Face(&'a FaceDetectionConfig),
}

/// Per-feature configuration (`videoContext` on the wire).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_transcription_config: Option<SpeechTranscriptionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_detection_config: Option<PersonDetectionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_detection_config: Option<FaceDetectionConfig>,
}

impl VideoContext {
    /// Configuration for a feature, if one was set.
    pub fn config_for(&self, feature: FeatureKind) -> Option<FeatureConfig<'_>> {
        match feature {
            FeatureKind::SpeechTranscription => self
                .speech_transcription_config
                .as_ref()
                .map(FeatureConfig::Speech),
            FeatureKind::PersonDetection => self
                .person_detection_config
                .as_ref()
                .map(FeatureConfig::Person),
            FeatureKind::FaceDetection => {
                self.face_detection_config.as_ref().map(FeatureConfig::Face)
            }
            _ => None,
        }
    }
}

/// A complete `videos:annotate` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub input_uri: String,
    pub output_uri: String,
    pub features: Vec<FeatureKind>,
    pub video_context: VideoContext,
}

impl AnalysisRequest {
    pub fn requests(&self, feature: FeatureKind) -> bool {
        self.features.contains(&feature)
    }
}
