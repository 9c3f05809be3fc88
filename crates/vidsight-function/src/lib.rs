//! Storage-triggered video annotation function.
//!
//! This crate provides:
//! - Trigger ingress for "object finalized" events (CloudEvents or legacy)
//! - Annotation request building and human-readable reports
//! - Create-if-absent provisioning of the analytic tables
//! - Projection of annotation results into label and transcript rows
//! - Prometheus metrics and structured invocation logging

pub mod backends;
pub mod cloud_event;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod projector;
pub mod report;
pub mod request_builder;
pub mod routes;
pub mod schema;
pub mod state;

pub use backends::{AnalyticStore, VideoAnnotator};
pub use config::FunctionConfig;
pub use error::{FunctionError, FunctionResult};
pub use orchestrator::{InvocationReport, Orchestrator};
pub use projector::{AppendReport, TableAppendOutcome};
pub use routes::create_router;
pub use state::AppState;
