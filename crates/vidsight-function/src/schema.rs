//! Table schemas and create-if-absent provisioning.

use tracing::info;
use vidsight_bigquery::{
    BigQueryError, FieldType, TableFieldSchema, TableLookup, TableSchema,
};

use crate::backends::AnalyticStore;
use crate::config::FunctionConfig;
use crate::error::FunctionResult;

/// Columns of the labels table.
pub fn labels_schema() -> TableSchema {
    TableSchema::new(vec![
        TableFieldSchema::required("file_name", FieldType::String),
        TableFieldSchema::required("label", FieldType::String),
        TableFieldSchema::nullable("confidence", FieldType::Float),
        TableFieldSchema::nullable("start_time", FieldType::Float),
        TableFieldSchema::nullable("end_time", FieldType::Float),
        TableFieldSchema::required("file_uri", FieldType::String),
    ])
}

/// Columns of the transcripts table.
pub fn transcripts_schema() -> TableSchema {
    TableSchema::new(vec![
        TableFieldSchema::required("file_name", FieldType::String),
        TableFieldSchema::required("transcript", FieldType::String),
        TableFieldSchema::nullable("confidence", FieldType::Float),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created,
    AlreadyExists,
}

/// Ensures both analytic tables exist.
pub struct SchemaProvisioner<'a> {
    store: &'a dyn AnalyticStore,
    config: &'a FunctionConfig,
}

impl<'a> SchemaProvisioner<'a> {
    pub fn new(store: &'a dyn AnalyticStore, config: &'a FunctionConfig) -> Self {
        Self { store, config }
    }

    /// Create whichever tables are missing. Labels first, then transcripts.
    pub async fn ensure_tables(&self) -> FunctionResult<[ProvisionOutcome; 2]> {
        let [labels_table, transcripts_table] = self.config.tables();
        let labels = self.ensure_table(labels_table, labels_schema()).await?;
        let transcripts = self
            .ensure_table(transcripts_table, transcripts_schema())
            .await?;
        Ok([labels, transcripts])
    }

    /// Only a not-found lookup leads to creation; any other lookup failure
    /// is returned. A create that loses a race to another invocation counts
    /// as already existing.
    pub async fn ensure_table(
        &self,
        table_id: &str,
        schema: TableSchema,
    ) -> FunctionResult<ProvisionOutcome> {
        match self.store.get_table(table_id).await? {
            TableLookup::Found(_) => {
                info!(table = %table_id, "Table {} already exists. Skipping creation.", table_id);
                Ok(ProvisionOutcome::AlreadyExists)
            }
            TableLookup::NotFound => match self.store.create_table(table_id, &schema).await {
                Ok(()) => {
                    info!(table = %table_id, "Table {} created.", table_id);
                    Ok(ProvisionOutcome::Created)
                }
                Err(BigQueryError::AlreadyExists(_)) => {
                    info!(
                        table = %table_id,
                        "Table {} was created concurrently. Skipping creation.", table_id
                    );
                    Ok(ProvisionOutcome::AlreadyExists)
                }
                Err(e) => Err(e.into()),
            },
        }
    }
}
