//! Application state.

use std::sync::Arc;

use vidsight_annotator::{AnnotatorClient, AnnotatorConfig};
use vidsight_bigquery::{BigQueryClient, BigQueryConfig};
use vidsight_gcp::TokenCache;

use crate::backends::{AnalyticStore, VideoAnnotator};
use crate::config::FunctionConfig;
use crate::orchestrator::Orchestrator;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<FunctionConfig>,
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// Build state around explicit backends.
    pub fn with_backends(
        config: FunctionConfig,
        annotator: Arc<dyn VideoAnnotator>,
        store: Arc<dyn AnalyticStore>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            orchestrator: Orchestrator::new(Arc::clone(&config), annotator, store),
            config,
        }
    }

    /// Create state with real clients sharing one credential cache.
    pub async fn new(config: FunctionConfig) -> anyhow::Result<Self> {
        let tokens = Arc::new(TokenCache::discover().await?);

        let annotator = AnnotatorClient::new(AnnotatorConfig::from_env(), tokens.clone())?;

        let bigquery_config =
            BigQueryConfig::new(&config.project_id, &config.dataset_id).with_env();
        let store = BigQueryClient::new(bigquery_config, tokens)?;

        Ok(Self::with_backends(config, Arc::new(annotator), Arc::new(store)))
    }
}
