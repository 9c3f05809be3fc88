//! BigQuery client tests against a mock REST endpoint.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use vidsight_bigquery::{
    BigQueryClient, BigQueryConfig, BigQueryError, FieldType, TableFieldSchema, TableLookup,
    TableSchema,
};
use vidsight_gcp::{HttpConfig, RetryConfig, StaticTokenSource};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const TABLES: &str = "/bigquery/v2/projects/demo/datasets/video_analytics/tables";

fn client(server: &MockServer) -> BigQueryClient {
    let config = BigQueryConfig {
        endpoint: server.uri(),
        project_id: "demo".to_string(),
        dataset_id: "video_analytics".to_string(),
        http: HttpConfig::default(),
        retry: RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
    };
    BigQueryClient::new(config, Arc::new(StaticTokenSource::new("test-token"))).unwrap()
}

fn schema() -> TableSchema {
    TableSchema::new(vec![
        TableFieldSchema::required("file_name", FieldType::String),
        TableFieldSchema::nullable("confidence", FieldType::Float),
    ])
}

#[derive(Serialize)]
struct Row {
    file_name: &'static str,
    confidence: Option<f64>,
}

#[tokio::test]
async fn test_get_table_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/annotation_labels", TABLES)))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tableReference": {"projectId": "demo", "datasetId": "video_analytics", "tableId": "annotation_labels"},
            "schema": {"fields": [{"name": "file_name", "type": "STRING", "mode": "REQUIRED"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    match client(&server).get_table("annotation_labels").await.unwrap() {
        TableLookup::Found(table) => {
            assert_eq!(table.table_reference.table_id, "annotation_labels");
        }
        TableLookup::NotFound => panic!("expected table to be found"),
    }
}

#[tokio::test]
async fn test_get_table_not_found_is_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/annotation_labels", TABLES)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Not found: Table demo:video_analytics.annotation_labels", "status": "NOT_FOUND"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lookup = client(&server).get_table("annotation_labels").await.unwrap();
    assert_eq!(lookup, TableLookup::NotFound);
}

#[tokio::test]
async fn test_get_table_permission_denied_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/annotation_labels", TABLES)))
        .respond_with(ResponseTemplate::new(403).set_body_string("Access Denied"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).get_table("annotation_labels").await.unwrap_err();
    assert!(matches!(err, BigQueryError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_create_table_sends_schema() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TABLES))
        .and(body_partial_json(json!({
            "tableReference": {"projectId": "demo", "datasetId": "video_analytics", "tableId": "annotation_labels"},
            "schema": {"fields": [
                {"name": "file_name", "type": "STRING", "mode": "REQUIRED"},
                {"name": "confidence", "type": "FLOAT", "mode": "NULLABLE"}
            ]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tableReference": {"projectId": "demo", "datasetId": "video_analytics", "tableId": "annotation_labels"},
            "creationTime": "1700000000000"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let table = client(&server)
        .create_table("annotation_labels", &schema())
        .await
        .unwrap();
    assert_eq!(table.creation_time.as_deref(), Some("1700000000000"));
}

#[tokio::test]
async fn test_create_table_conflict_is_already_exists() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TABLES))
        .respond_with(ResponseTemplate::new(409).set_body_string("Already Exists: Table"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .create_table("annotation_labels", &schema())
        .await
        .unwrap_err();
    assert!(matches!(err, BigQueryError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_insert_rows_reports_row_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{}/annotation_labels/insertAll", TABLES)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "bigquery#tableDataInsertAllResponse",
            "insertErrors": [{"index": 1, "errors": [{"reason": "invalid", "message": "bad value"}]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = [
        Row { file_name: "a.mp4", confidence: Some(0.5) },
        Row { file_name: "a.mp4", confidence: None },
        Row { file_name: "a.mp4", confidence: Some(0.9) },
    ];

    let errors = client(&server)
        .insert_rows("annotation_labels", &rows)
        .await
        .unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].index, 1);
    assert_eq!(errors[0].errors[0].reason, "invalid");
}

#[tokio::test]
async fn test_insert_rows_assigns_unique_insert_ids() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{}/annotation_transcripts/insertAll", TABLES)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let rows = [
        Row { file_name: "a.mp4", confidence: Some(0.5) },
        Row { file_name: "a.mp4", confidence: Some(0.6) },
    ];

    let errors = client(&server)
        .insert_rows("annotation_transcripts", &rows)
        .await
        .unwrap();
    assert!(errors.is_empty());

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let sent = body["rows"].as_array().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["json"]["file_name"], "a.mp4");
    assert_ne!(sent[0]["insertId"], sent[1]["insertId"]);
}

#[tokio::test]
async fn test_insert_empty_rows_skips_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let rows: [Row; 0] = [];
    let errors = client(&server)
        .insert_rows("annotation_labels", &rows)
        .await
        .unwrap();
    assert!(errors.is_empty());
}

#[tokio::test]
async fn test_insert_retries_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{}/annotation_labels/insertAll", TABLES)))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{}/annotation_labels/insertAll", TABLES)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let rows = [Row { file_name: "a.mp4", confidence: None }];
    let errors = client(&server)
        .insert_rows("annotation_labels", &rows)
        .await
        .unwrap();
    assert!(errors.is_empty());
}
