//! reqwest transport for the data server's JSON endpoints.

use std::time::Duration;

use async_trait::async_trait;
use census_common::{
    BoundaryZoomTable, ChoroplethError, ChoroplethResult, FeatureBatch, MetadataDocument, NUM_BREAKS,
    ZoomRange,
};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::ViewerConfig;
use crate::fetch::DataRequest;
use crate::source::CensusSource;

/// Census data server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCensusSource {
    client: Client,
    base_url: String,
}

impl HttpCensusSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ChoroplethResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| ChoroplethError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ViewerConfig) -> ChoroplethResult<Self> {
        Self::new(config.base_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn get_json(&self, endpoint: &str, query: &[(&str, String)]) -> ChoroplethResult<Value> {
        let url = self.url(endpoint);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?;

        response.json::<Value>().await.map_err(transport_error)
    }
}

/// Timeouts are distinguished; undecodable bodies are document errors.
fn transport_error(err: reqwest::Error) -> ChoroplethError {
    if err.is_timeout() {
        ChoroplethError::Timeout
    } else if err.is_decode() {
        ChoroplethError::InvalidDocument(err.to_string())
    } else {
        ChoroplethError::Transport(err.to_string())
    }
}

#[async_trait(?Send)]
impl CensusSource for HttpCensusSource {
    #[instrument(skip(self))]
    async fn boundary_zooms(&self, zooms: ZoomRange) -> ChoroplethResult<BoundaryZoomTable> {
        let query = [("min", zooms.min.to_string()), ("max", zooms.max.to_string())];
        let body = self.get_json("get-bdy-names", &query).await?;
        BoundaryZoomTable::from_value(body)
    }

    #[instrument(skip(self))]
    async fn stats_metadata(&self, stat_ids: &[String]) -> ChoroplethResult<MetadataDocument> {
        let query = [("n", NUM_BREAKS.to_string()), ("stats", stat_ids.join(","))];
        let body = self.get_json("get-metadata", &query).await?;
        MetadataDocument::from_json(&body.to_string())
    }

    #[instrument(skip(self, request), fields(sequence = request.sequence))]
    async fn fetch_features(&self, request: &DataRequest) -> ChoroplethResult<Option<FeatureBatch>> {
        let body = self.get_json("get-data", &request.query_pairs()).await?;
        FeatureBatch::from_geojson(body, &request.stat.id)
    }
}
