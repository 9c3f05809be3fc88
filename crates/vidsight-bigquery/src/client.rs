//! BigQuery REST client for one dataset.

use std::sync::Arc;
use std::time::Instant;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;
use vidsight_gcp::metrics::record_request;
use vidsight_gcp::{
    build_http_client, send_authorized, with_retry, HttpConfig, HttpReply, RetryConfig, TokenCache,
    TokenSource,
};

use crate::error::{BigQueryError, BigQueryResult};
use crate::types::{
    InsertAllRequest, InsertAllResponse, InsertRow, RowInsertError, Table, TableLookup,
    TableReference, TableSchema,
};

const DEFAULT_ENDPOINT: &str = "https://bigquery.googleapis.com";

// =============================================================================
// Configuration
// =============================================================================

/// BigQuery client configuration.
#[derive(Debug, Clone)]
pub struct BigQueryConfig {
    /// API root, without the `/bigquery/v2` path
    pub endpoint: String,
    /// GCP project ID
    pub project_id: String,
    /// Dataset holding the tables
    pub dataset_id: String,
    /// HTTP client tuning
    pub http: HttpConfig,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl BigQueryConfig {
    pub fn new(project_id: impl Into<String>, dataset_id: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> BigQueryResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("GOOGLE_CLOUD_PROJECT"))
            .or_else(|_| std::env::var("GCLOUD_PROJECT"))
            .map_err(|_| {
                BigQueryError::Configuration(
                    "GCP_PROJECT_ID or GOOGLE_CLOUD_PROJECT must be set to access BigQuery"
                        .to_string(),
                )
            })?;

        if project_id.is_empty() {
            return Err(BigQueryError::Configuration(
                "GCP_PROJECT_ID cannot be empty".to_string(),
            ));
        }

        let dataset_id =
            std::env::var("BIGQUERY_DATASET").unwrap_or_else(|_| "video_analytics".to_string());

        Ok(Self::new(project_id, dataset_id).with_env())
    }

    /// Apply endpoint, HTTP and retry settings from the environment.
    pub fn with_env(self) -> Self {
        Self {
            endpoint: std::env::var("BIGQUERY_ENDPOINT")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(self.endpoint),
            http: HttpConfig::from_env(),
            retry: RetryConfig::from_env(),
            ..self
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// BigQuery REST API client scoped to one dataset.
#[derive(Clone)]
pub struct BigQueryClient {
    http: Client,
    config: BigQueryConfig,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl BigQueryClient {
    /// Create a client with an explicit token source.
    pub fn new(config: BigQueryConfig, tokens: Arc<dyn TokenSource>) -> BigQueryResult<Self> {
        let http = build_http_client(
            &config.http,
            concat!("vidsight-bigquery/", env!("CARGO_PKG_VERSION")),
        )?;

        let base_url = format!(
            "{}/bigquery/v2/projects/{}/datasets/{}/tables",
            config.endpoint,
            urlencoding::encode(&config.project_id),
            urlencoding::encode(&config.dataset_id)
        );

        Ok(Self {
            http,
            config,
            base_url,
            tokens,
        })
    }

    /// Create from environment variables and ambient credentials.
    pub async fn from_env() -> BigQueryResult<Self> {
        let config = BigQueryConfig::from_env()?;
        let tokens = TokenCache::discover()
            .await
            .map_err(|e| BigQueryError::AuthError(e.0))?;
        Self::new(config, Arc::new(tokens))
    }

    pub fn config(&self) -> &BigQueryConfig {
        &self.config
    }

    /// Reference to a table in this client's dataset.
    pub fn table_ref(&self, table_id: &str) -> TableReference {
        TableReference::new(&self.config.project_id, &self.config.dataset_id, table_id)
    }

    fn table_url(&self, table_id: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(table_id))
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// Look a table up.
    ///
    /// A 404 is `TableLookup::NotFound`; every other failure is an error.
    pub async fn get_table(&self, table_id: &str) -> BigQueryResult<TableLookup> {
        let url = self.table_url(table_id);

        self.execute_request("get_table", async {
            with_retry(&self.config.retry, "get_table", || async {
                let reply = send_authorized(self.tokens.as_ref(), |token| {
                    self.http.get(&url).bearer_auth(token)
                })
                .await?;

                match reply.status {
                    StatusCode::NOT_FOUND => Ok(TableLookup::NotFound),
                    _ => Self::parse_json::<Table>(&url, reply).map(TableLookup::Found),
                }
            })
            .await
        })
        .await
    }

    /// Create a table with the given schema.
    ///
    /// Returns `BigQueryError::AlreadyExists` if the table is already there.
    pub async fn create_table(&self, table_id: &str, schema: &TableSchema) -> BigQueryResult<Table> {
        let url = self.base_url.clone();
        let table = Table {
            table_reference: self.table_ref(table_id),
            schema: Some(schema.clone()),
            creation_time: None,
        };

        self.execute_request("create_table", async {
            with_retry(&self.config.retry, "create_table", || async {
                let reply = send_authorized(self.tokens.as_ref(), |token| {
                    self.http.post(&url).bearer_auth(token).json(&table)
                })
                .await?;
                Self::parse_json::<Table>(&url, reply)
            })
            .await
        })
        .await
    }

    // =========================================================================
    // Rows
    // =========================================================================

    /// Append rows with `tabledata.insertAll`.
    ///
    /// Each row gets a fresh insert ID, so a retried request is deduplicated
    /// by BigQuery on a best-effort basis. Row-level rejections come back as
    /// the `Ok` value; an empty vector means every row was accepted.
    pub async fn insert_rows<T: Serialize>(
        &self,
        table_id: &str,
        rows: &[T],
    ) -> BigQueryResult<Vec<RowInsertError>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/insertAll", self.table_url(table_id));
        let request = InsertAllRequest {
            skip_invalid_rows: false,
            ignore_unknown_values: false,
            rows: rows
                .iter()
                .map(|row| {
                    let json = match serde_json::to_value(row)? {
                        serde_json::Value::Object(map) => map,
                        other => {
                            return Err(BigQueryError::request_failed(format!(
                                "row must serialize to a JSON object, got {}",
                                other
                            )))
                        }
                    };
                    Ok(InsertRow {
                        insert_id: Uuid::new_v4().to_string(),
                        json,
                    })
                })
                .collect::<BigQueryResult<Vec<_>>>()?,
        };

        debug!(table = %table_id, rows = rows.len(), "Inserting rows");

        self.execute_request("insert_all", async {
            with_retry(&self.config.retry, "insert_all", || async {
                let reply = send_authorized(self.tokens.as_ref(), |token| {
                    self.http.post(&url).bearer_auth(token).json(&request)
                })
                .await?;
                Self::parse_json::<InsertAllResponse>(&url, reply)
            })
            .await
        })
        .await
        .map(|response| response.insert_errors)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn parse_json<T: serde::de::DeserializeOwned>(url: &str, reply: HttpReply) -> BigQueryResult<T> {
        match reply.status {
            status if status.is_success() => serde_json::from_str(&reply.body).map_err(|e| {
                BigQueryError::invalid_response(format!(
                    "Failed to parse response: {} (body prefix: {})",
                    e,
                    reply.body_prefix()
                ))
            }),
            StatusCode::TOO_MANY_REQUESTS => Err(BigQueryError::RateLimited(
                reply.retry_after_ms.unwrap_or(1000),
            )),
            status => Err(BigQueryError::from_http_status(
                status.as_u16(),
                format!("{} failed: {}", url, reply.body),
            )),
        }
    }

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(&self, operation: &str, fut: F) -> BigQueryResult<T>
    where
        F: std::future::Future<Output = BigQueryResult<T>>,
    {
        let span = info_span!(
            "bigquery_request",
            operation = %operation,
            dataset = %self.config.dataset_id
        );

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request("bigquery", operation, status, latency_ms);

        result
    }
}

impl std::fmt::Debug for BigQueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigQueryClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("GCP_PROJECT_ID", "demo-project");
        std::env::set_var("BIGQUERY_DATASET", "clips");
        std::env::set_var("BIGQUERY_ENDPOINT", "http://localhost:9050/");

        let config = BigQueryConfig::from_env().unwrap();
        assert_eq!(config.project_id, "demo-project");
        assert_eq!(config.dataset_id, "clips");
        assert_eq!(config.endpoint, "http://localhost:9050");

        std::env::remove_var("GCP_PROJECT_ID");
        std::env::remove_var("BIGQUERY_DATASET");
        std::env::remove_var("BIGQUERY_ENDPOINT");
    }

    #[test]
    #[serial]
    fn test_config_requires_project() {
        std::env::remove_var("GCP_PROJECT_ID");
        std::env::remove_var("GOOGLE_CLOUD_PROJECT");
        std::env::remove_var("GCLOUD_PROJECT");

        assert!(matches!(
            BigQueryConfig::from_env(),
            Err(BigQueryError::Configuration(_))
        ));
    }

    #[test]
    fn test_config_defaults() {
        let config = BigQueryConfig::new("p", "d");
        assert_eq!(config.endpoint, "https://bigquery.googleapis.com");
        assert_eq!(config.dataset_id, "d");
    }
}
