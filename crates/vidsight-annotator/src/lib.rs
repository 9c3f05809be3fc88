//! Video Intelligence API client.
//!
//! This crate provides:
//! - `videos:annotate` submission
//! - Long-running operation polling until completion or deadline
//! - Retry of transient HTTP failures on each individual call

pub mod client;
pub mod error;
pub mod operation;

pub use client::{AnnotatorClient, AnnotatorConfig};
pub use error::{AnnotateError, AnnotateResult};
pub use operation::{AnnotateVideoProgress, AnnotateVideoResponse, Operation};
