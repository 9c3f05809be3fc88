//! Turns a storage event into an annotation request.

use tracing::info;
use vidsight_models::{
    AnalysisEvent, AnalysisRequest, FaceDetectionConfig, PersonDetectionConfig,
    SpeechTranscriptionConfig, VideoContext, ALL_FEATURES,
};

use crate::config::FunctionConfig;

/// Per-feature configuration sent with every request.
pub fn video_context(config: &FunctionConfig) -> VideoContext {
    VideoContext {
        speech_transcription_config: Some(SpeechTranscriptionConfig::new(
            config.speech_language.as_str(),
        )),
        person_detection_config: Some(PersonDetectionConfig::default()),
        face_detection_config: Some(FaceDetectionConfig::default()),
    }
}

/// `{output_bucket}/{stem}.json`
pub fn output_uri(config: &FunctionConfig, event: &AnalysisEvent) -> String {
    format!("{}/{}.json", config.output_bucket, event.file_stem())
}

/// Build the annotation request for an event.
pub fn build_request(config: &FunctionConfig, event: &AnalysisEvent) -> AnalysisRequest {
    let request = AnalysisRequest {
        input_uri: event.input_uri(),
        output_uri: output_uri(config, event),
        features: ALL_FEATURES.to_vec(),
        video_context: video_context(config),
    };

    info!(input_uri = %request.input_uri, "Processing video \"{}\"", request.input_uri);
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidsight_models::{FeatureConfig, FeatureKind};

    #[test]
    fn test_clip_scenario() {
        let config = FunctionConfig::default();
        let event = AnalysisEvent::new("b", "clip.mp4").unwrap();

        let request = build_request(&config, &event);
        assert_eq!(request.input_uri, "gs://b/clip.mp4");
        assert_eq!(request.output_uri, "gs://outputbucket-cloud9/clip.json");
    }

    #[test]
    fn test_multiple_dots_collapse_to_first_stem() {
        let config = FunctionConfig::default();
        let event = AnalysisEvent::new("b", "a.b.mp4").unwrap();
        assert_eq!(output_uri(&config, &event), "gs://outputbucket-cloud9/a.json");
    }

    #[test]
    fn test_fixed_feature_set() {
        let request = build_request(
            &FunctionConfig::default(),
            &AnalysisEvent::new("b", "clip.mp4").unwrap(),
        );

        assert_eq!(request.features.len(), 9);
        for feature in ALL_FEATURES {
            assert!(request.requests(feature), "{} missing", feature.as_str());
        }
    }

    #[test]
    fn test_feature_configs() {
        let context = video_context(&FunctionConfig::default());

        match context.config_for(FeatureKind::SpeechTranscription) {
            Some(FeatureConfig::Speech(speech)) => {
                assert_eq!(speech.language_code, "en-US");
                assert!(speech.enable_automatic_punctuation);
            }
            other => panic!("unexpected speech config: {:?}", other),
        }
        match context.config_for(FeatureKind::PersonDetection) {
            Some(FeatureConfig::Person(person)) => {
                assert!(person.include_bounding_boxes);
                assert!(!person.include_attributes);
                assert!(person.include_pose_landmarks);
            }
            other => panic!("unexpected person config: {:?}", other),
        }
        match context.config_for(FeatureKind::FaceDetection) {
            Some(FeatureConfig::Face(face)) => {
                assert!(face.include_bounding_boxes);
                assert!(face.include_attributes);
            }
            other => panic!("unexpected face config: {:?}", other),
        }
        assert!(context.config_for(FeatureKind::LabelDetection).is_none());
    }
}
