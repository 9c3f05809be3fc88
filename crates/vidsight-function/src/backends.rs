//! Seams between the orchestration logic and the remote services.

use async_trait::async_trait;
use serde_json::Value;
use vidsight_annotator::{AnnotateError, AnnotatorClient};
use vidsight_bigquery::{BigQueryClient, BigQueryResult, RowInsertError, TableLookup, TableSchema};
use vidsight_models::{AnalysisRequest, AnnotationResultSet};

/// Runs an annotation request to completion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoAnnotator: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest)
        -> Result<AnnotationResultSet, AnnotateError>;
}

/// Table operations the function needs from the analytic store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticStore: Send + Sync {
    async fn get_table(&self, table_id: &str) -> BigQueryResult<TableLookup>;

    async fn create_table(&self, table_id: &str, schema: &TableSchema) -> BigQueryResult<()>;

    /// Append rows; the `Ok` value lists rejected rows.
    async fn insert_rows(
        &self,
        table_id: &str,
        rows: Vec<Value>,
    ) -> BigQueryResult<Vec<RowInsertError>>;
}

#[async_trait]
impl VideoAnnotator for AnnotatorClient {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnnotationResultSet, AnnotateError> {
        self.annotate(request).await
    }
}

#[async_trait]
impl AnalyticStore for BigQueryClient {
    async fn get_table(&self, table_id: &str) -> BigQueryResult<TableLookup> {
        BigQueryClient::get_table(self, table_id).await
    }

    async fn create_table(&self, table_id: &str, schema: &TableSchema) -> BigQueryResult<()> {
        BigQueryClient::create_table(self, table_id, schema)
            .await
            .map(|_| ())
    }

    async fn insert_rows(
        &self,
        table_id: &str,
        rows: Vec<Value>,
    ) -> BigQueryResult<Vec<RowInsertError>> {
        BigQueryClient::insert_rows(self, table_id, &rows).await
    }
}
