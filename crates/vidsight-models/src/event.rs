//! Storage change events.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// An object that landed in a storage bucket and should be analyzed.
///
/// Construct with [`AnalysisEvent::new`], which rejects events that cannot
/// produce an output location (empty fields, object name without a `.`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisEvent {
    pub bucket: String,
    pub object_name: String,
}

impl AnalysisEvent {
    /// Validate and build an event.
    pub fn new(bucket: impl Into<String>, object_name: impl Into<String>) -> ModelResult<Self> {
        let bucket = bucket.into();
        let object_name = object_name.into();

        if bucket.trim().is_empty() {
            return Err(ModelError::MissingField("bucket"));
        }
        if object_name.trim().is_empty() {
            return Err(ModelError::MissingField("name"));
        }
        if !object_name.contains('.') {
            return Err(ModelError::missing_extension(object_name));
        }

        Ok(Self {
            bucket,
            object_name,
        })
    }

    /// `gs://{bucket}/{object_name}`
    pub fn input_uri(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.object_name)
    }

    /// Everything before the first `.` of the object name.
    ///
    /// `a.b.mp4` yields `a`, and a nested key such as `dir/clip.mp4` keeps
    /// its prefix (`dir/clip`).
    pub fn file_stem(&self) -> &str {
        self.object_name
            .split('.')
            .next()
            .unwrap_or(self.object_name.as_str())
    }
}

impl fmt::Display for AnalysisEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.object_name)
    }
}
