//! Shared data models for the Vidsight video annotation function.
//!
//! This crate provides Serde-serializable types for:
//! - Storage events that trigger an analysis
//! - Annotation requests (features and per-feature configuration)
//! - Annotation results as returned by the Video Intelligence API
//! - Rows persisted to the analytic tables

pub mod annotation;
pub mod error;
pub mod event;
pub mod offset;
pub mod request;
pub mod rows;

pub use annotation::{
    AnnotationResultSet, AnnotationStatus, Entity, LabelAnnotation, LabelSegment, ResultFamily,
    SpeechAlternative, SpeechTranscription, TimeSegment, VideoAnnotationResults,
};
pub use error::{ModelError, ModelResult};
pub use event::AnalysisEvent;
pub use request::{
    AnalysisRequest, FaceDetectionConfig, FeatureConfig, FeatureKind, PersonDetectionConfig,
    SpeechTranscriptionConfig, VideoContext, ALL_FEATURES,
};
pub use rows::{LabelRow, TranscriptRow};
