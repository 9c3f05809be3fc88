//! Model validation errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Missing event field: {0}")]
    MissingField(&'static str),

    #[error("Object name has no extension: {0}")]
    MissingExtension(String),
}

impl ModelError {
    pub fn missing_extension(name: impl Into<String>) -> Self {
        Self::MissingExtension(name.into())
    }
}
