//! BigQuery REST resource types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Tables
// =============================================================================

/// Fully-qualified table identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableReference {
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
        }
    }
}

/// Column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    String,
    Float,
    Integer,
    Boolean,
    Timestamp,
}

/// Column mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

/// One column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub mode: FieldMode,
}

impl TableFieldSchema {
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            mode: FieldMode::Required,
        }
    }

    pub fn nullable(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            mode: FieldMode::Nullable,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<TableFieldSchema>,
}

impl TableSchema {
    pub fn new(fields: Vec<TableFieldSchema>) -> Self {
        Self { fields }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// Table resource. Only the fields this crate reads or writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub table_reference: TableReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<String>,
}

/// Outcome of looking a table up.
#[derive(Debug, Clone, PartialEq)]
pub enum TableLookup {
    Found(Table),
    NotFound,
}

// =============================================================================
// Streaming inserts
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertAllRequest {
    pub skip_invalid_rows: bool,
    pub ignore_unknown_values: bool,
    pub rows: Vec<InsertRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertRow {
    pub insert_id: String,
    pub json: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertAllResponse {
    #[serde(default)]
    pub insert_errors: Vec<RowInsertError>,
}

/// Errors reported for one row of an insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowInsertError {
    /// Position of the row in the request
    pub index: u32,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

/// Error detail, as BigQuery reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorProto {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for RowInsertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}:", self.index)?;
        for (i, e) in self.errors.iter().enumerate() {
            let sep = if i == 0 { " " } else { "; " };
            write!(f, "{}{}", sep, e.reason)?;
            if !e.location.is_empty() {
                write!(f, " at {}", e.location)?;
            }
            if !e.message.is_empty() {
                write!(f, " ({})", e.message)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_wire_format() {
        let table = Table {
            table_reference: TableReference::new("p", "d", "t"),
            schema: Some(TableSchema::new(vec![
                TableFieldSchema::required("file_name", FieldType::String),
                TableFieldSchema::nullable("confidence", FieldType::Float),
            ])),
            creation_time: None,
        };

        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(
            value,
            json!({
                "tableReference": {"projectId": "p", "datasetId": "d", "tableId": "t"},
                "schema": {"fields": [
                    {"name": "file_name", "type": "STRING", "mode": "REQUIRED"},
                    {"name": "confidence", "type": "FLOAT", "mode": "NULLABLE"}
                ]}
            })
        );
    }

    #[test]
    fn test_table_parses_with_missing_mode() {
        let table: Table = serde_json::from_value(json!({
            "kind": "bigquery#table",
            "tableReference": {"projectId": "p", "datasetId": "d", "tableId": "t"},
            "schema": {"fields": [{"name": "label", "type": "STRING"}]},
            "creationTime": "1700000000000"
        }))
        .unwrap();

        let schema = table.schema.unwrap();
        assert_eq!(schema.fields[0].mode, FieldMode::Nullable);
        assert_eq!(schema.column_names().collect::<Vec<_>>(), vec!["label"]);
    }

    #[test]
    fn test_insert_errors_parse() {
        let response: InsertAllResponse = serde_json::from_value(json!({
            "kind": "bigquery#tableDataInsertAllResponse",
            "insertErrors": [
                {"index": 2, "errors": [{"reason": "invalid", "location": "label", "message": "Missing required field"}]}
            ]
        }))
        .unwrap();

        assert_eq!(response.insert_errors.len(), 1);
        assert_eq!(response.insert_errors[0].index, 2);
        assert_eq!(
            response.insert_errors[0].to_string(),
            "row 2: invalid at label (Missing required field)"
        );
    }

    #[test]
    fn test_empty_insert_response() {
        let response: InsertAllResponse =
            serde_json::from_value(json!({"kind": "bigquery#tableDataInsertAllResponse"})).unwrap();
        assert!(response.insert_errors.is_empty());
    }
}
