//! BigQuery REST API client.
//!
//! This crate provides:
//! - Table lookup with an explicit found / not-found result
//! - Table creation from a column schema
//! - Streaming row inserts (`tabledata.insertAll`) with per-row errors
//! - Retry of transient failures, token refresh on expiry

pub mod client;
pub mod error;
pub mod types;

pub use client::{BigQueryClient, BigQueryConfig};
pub use error::{BigQueryError, BigQueryResult};
pub use types::{
    ErrorProto, FieldMode, FieldType, RowInsertError, Table, TableFieldSchema, TableLookup,
    TableReference, TableSchema,
};
